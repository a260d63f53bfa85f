//! Reconciliation merge
//!
//! Applies a batch of parsed rows to a keyed store. A full upload replaces
//! the record set, a partial upload upserts by product code. Every merge
//! appends exactly one entry to the upload log.

use std::collections::BTreeMap;
use std::convert::Infallible;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::record::{ParsedRow, StockRecord, UploadBatch, UploadKind};
use crate::core::restock::{RestockEntry, RestockPolicy};

/// Keyed persistence contract the merge relies on
///
/// Implementations own durability and read ordering; the merge only needs
/// lookups by code and the write primitives below.
pub trait StockStore {
    type Error;

    fn get(&self, code: &str) -> Result<Option<StockRecord>, Self::Error>;

    fn insert(&mut self, record: StockRecord) -> Result<(), Self::Error>;

    /// Overwrite the record with the same code
    fn update(&mut self, record: StockRecord) -> Result<(), Self::Error>;

    /// Delete every stock record (the upload log and restock queue stay)
    fn clear_records(&mut self) -> Result<(), Self::Error>;

    /// Append to the upload log, returning the assigned id
    fn append_batch(&mut self, batch: &UploadBatch) -> Result<i64, Self::Error>;

    /// Whether an unresolved restock entry exists for `code`, expired or not
    fn has_unresolved_restock(&self, code: &str) -> Result<bool, Self::Error>;

    /// Append to the restock queue, returning the assigned id
    fn push_restock(&mut self, entry: &RestockEntry) -> Result<i64, Self::Error>;
}

/// A processed spreadsheet ready to merge
#[derive(Debug, Clone, Copy)]
pub struct Upload<'a> {
    pub kind: UploadKind,
    pub source_file_name: &'a str,
    pub rows: &'a [ParsedRow],
}

/// Batch level counts of a merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeResult {
    pub new_count: usize,
    pub updated_count: usize,
    pub divergent_count: usize,
    pub restock_count: usize,
    /// The upload log entry that was appended
    pub batch: UploadBatch,
}

impl MergeResult {
    pub fn row_count(&self) -> usize {
        self.batch.row_count
    }
}

/// Merge `upload` into `store`
///
/// Rows sharing a code inside one batch are applied in order, so the last
/// one wins. In a full upload `new_count` is the number of rows.
pub fn merge_batch<S: StockStore>(
    store: &mut S,
    upload: &Upload<'_>,
    restock: &RestockPolicy,
    now: DateTime<Utc>,
) -> Result<MergeResult, S::Error> {
    let mut new_count = 0;
    let mut updated_count = 0;

    if upload.kind == UploadKind::Full {
        store.clear_records()?;
    }

    for row in upload.rows {
        match store.get(&row.code)? {
            Some(mut existing) => {
                existing.apply_row(row, now);
                store.update(existing)?;
                if upload.kind == UploadKind::Partial {
                    updated_count += 1;
                }
            }
            None => {
                store.insert(StockRecord::from_row(row, now))?;
                if upload.kind == UploadKind::Partial {
                    new_count += 1;
                }
            }
        }
    }

    if upload.kind == UploadKind::Full {
        new_count = upload.rows.len();
    }

    let divergent_count = upload.rows.iter().filter(|r| r.is_divergent()).count();

    let restock_count = match upload.kind {
        UploadKind::Partial => queue_restock(store, upload.rows, restock, now)?,
        UploadKind::Full => 0,
    };

    let mut batch = UploadBatch {
        id: 0,
        timestamp: now,
        kind: upload.kind,
        source_file_name: upload.source_file_name.to_string(),
        row_count: upload.rows.len(),
        new_count,
        updated_count,
        divergent_count,
    };
    batch.id = store.append_batch(&batch)?;

    log::info!(
        "merged {} upload '{}': {} rows, {} new, {} updated, {} divergent, {} queued for restock",
        upload.kind,
        upload.source_file_name,
        batch.row_count,
        new_count,
        updated_count,
        divergent_count,
        restock_count
    );

    Ok(MergeResult {
        new_count,
        updated_count,
        divergent_count,
        restock_count,
        batch,
    })
}

/// Queue eligible rows that have no unresolved entry yet
fn queue_restock<S: StockStore>(
    store: &mut S,
    rows: &[ParsedRow],
    policy: &RestockPolicy,
    now: DateTime<Utc>,
) -> Result<usize, S::Error> {
    let mut queued = 0;
    for row in rows {
        let Some(entry) = policy.candidate(row, now) else {
            continue;
        };
        if store.has_unresolved_restock(&entry.code)? {
            continue;
        }
        store.push_restock(&entry)?;
        queued += 1;
    }
    Ok(queued)
}

/// In-memory store, used for dry runs and tests
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: BTreeMap<String, StockRecord>,
    batches: Vec<UploadBatch>,
    restock: Vec<RestockEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing records
    pub fn with_records(records: impl IntoIterator<Item = StockRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| (r.code.clone(), r))
                .collect(),
            ..Self::default()
        }
    }

    /// Seed the restock queue, so unresolved entries block duplicates
    pub fn with_restock(mut self, entries: impl IntoIterator<Item = RestockEntry>) -> Self {
        self.restock = entries.into_iter().collect();
        self
    }

    pub fn records(&self) -> impl Iterator<Item = &StockRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn batches(&self) -> &[UploadBatch] {
        &self.batches
    }

    pub fn restock_entries(&self) -> &[RestockEntry] {
        &self.restock
    }

    /// Mark a restock entry resolved
    pub fn resolve_restock(&mut self, id: i64, now: DateTime<Utc>) -> bool {
        match self.restock.iter_mut().find(|e| e.id == id && !e.resolved) {
            Some(entry) => {
                entry.resolved = true;
                entry.resolved_at = Some(now);
                true
            }
            None => false,
        }
    }
}

impl StockStore for MemoryStore {
    type Error = Infallible;

    fn get(&self, code: &str) -> Result<Option<StockRecord>, Self::Error> {
        Ok(self.records.get(code).cloned())
    }

    fn insert(&mut self, record: StockRecord) -> Result<(), Self::Error> {
        self.records.insert(record.code.clone(), record);
        Ok(())
    }

    fn update(&mut self, record: StockRecord) -> Result<(), Self::Error> {
        self.records.insert(record.code.clone(), record);
        Ok(())
    }

    fn clear_records(&mut self) -> Result<(), Self::Error> {
        self.records.clear();
        Ok(())
    }

    fn append_batch(&mut self, batch: &UploadBatch) -> Result<i64, Self::Error> {
        let id = self.batches.len() as i64 + 1;
        let mut batch = batch.clone();
        batch.id = id;
        self.batches.push(batch);
        Ok(id)
    }

    fn has_unresolved_restock(&self, code: &str) -> Result<bool, Self::Error> {
        Ok(self.restock.iter().any(|e| e.code == code && !e.resolved))
    }

    fn push_restock(&mut self, entry: &RestockEntry) -> Result<i64, Self::Error> {
        let id = self.restock.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let mut entry = entry.clone();
        entry.id = id;
        self.restock.push(entry);
        Ok(id)
    }
}
