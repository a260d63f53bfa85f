//! Read queries and restock resolution

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use super::{
    format_datetime, get_datetime, get_optional_datetime, RecordFilter, StockDb, StoreError,
    StoreStats, RECORD_COLUMNS,
};
use crate::core::annotation::Status;
use crate::core::record::{StockRecord, UploadBatch};
use crate::core::restock::{RestockEntry, RestockPolicy};
use crate::core::text::fold_upper;

const RESTOCK_COLUMNS: &str =
    "id, code, product_name, category, quantity_sold, created_at, resolved, resolved_at";

pub(super) fn row_to_record(row: &Row<'_>) -> rusqlite::Result<StockRecord> {
    Ok(StockRecord {
        code: row.get(0)?,
        product_name: row.get(1)?,
        category: row.get(2)?,
        system_quantity: row.get(3)?,
        physical_quantity: row.get(4)?,
        difference: row.get(5)?,
        note: row.get(6)?,
        status: row.get(7)?,
        last_counted_at: get_optional_datetime(row, 8)?,
        created_at: get_datetime(row, 9)?,
    })
}

fn row_to_batch(row: &Row<'_>) -> rusqlite::Result<UploadBatch> {
    Ok(UploadBatch {
        id: row.get(0)?,
        timestamp: get_datetime(row, 1)?,
        kind: row.get(2)?,
        source_file_name: row.get(3)?,
        row_count: row.get::<_, i64>(4)?.max(0) as usize,
        new_count: row.get::<_, i64>(5)?.max(0) as usize,
        updated_count: row.get::<_, i64>(6)?.max(0) as usize,
        divergent_count: row.get::<_, i64>(7)?.max(0) as usize,
    })
}

fn row_to_restock(row: &Row<'_>) -> rusqlite::Result<RestockEntry> {
    Ok(RestockEntry {
        id: row.get(0)?,
        code: row.get(1)?,
        product_name: row.get(2)?,
        category: row.get(3)?,
        quantity_sold: row.get(4)?,
        created_at: get_datetime(row, 5)?,
        resolved: row.get(6)?,
        resolved_at: get_optional_datetime(row, 7)?,
    })
}

impl StockDb {
    /// Records matching `filter`, ordered by category then product name
    pub fn list_records(&self, filter: &RecordFilter) -> Result<Vec<StockRecord>, StoreError> {
        let mut sql = format!("SELECT {RECORD_COLUMNS} FROM stock_records WHERE 1=1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(category) = filter.category {
            sql.push_str(" AND category = ?");
            params_vec.push(Box::new(category));
        }

        if !filter.statuses.is_empty() {
            let placeholders = vec!["?"; filter.statuses.len()].join(", ");
            sql.push_str(&format!(" AND status IN ({placeholders})"));
            for status in &filter.statuses {
                params_vec.push(Box::new(*status));
            }
        }

        if filter.uncounted_only {
            sql.push_str(" AND last_counted_at IS NULL");
        }

        sql.push_str(" ORDER BY category, product_name, code");

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let mut records = stmt
            .query_map(params_refs.as_slice(), row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        // literal, accent-folded substring match on name or code
        if let Some(needle) = filter.search.as_deref().map(|s| fold_upper(s.trim())) {
            if !needle.is_empty() {
                records.retain(|r| {
                    fold_upper(&r.product_name).contains(&needle)
                        || fold_upper(&r.code).contains(&needle)
                });
            }
        }
        Ok(records)
    }

    /// Every record
    pub fn all_records(&self) -> Result<Vec<StockRecord>, StoreError> {
        self.list_records(&RecordFilter::default())
    }

    pub fn record_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM stock_records", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Upload log, most recent first
    pub fn list_batches(&self) -> Result<Vec<UploadBatch>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, kind, source_file_name, row_count, new_count, \
             updated_count, divergent_count FROM upload_batches ORDER BY id DESC",
        )?;
        let batches = stmt
            .query_map([], row_to_batch)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(batches)
    }

    /// Unresolved entries created inside the expiry window, oldest first
    pub fn pending_restock(
        &self,
        policy: &RestockPolicy,
        now: DateTime<Utc>,
    ) -> Result<Vec<RestockEntry>, StoreError> {
        let sql = format!(
            "SELECT {RESTOCK_COLUMNS} FROM restock_queue \
             WHERE resolved = 0 AND created_at >= ?1 ORDER BY created_at, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![format_datetime(policy.cutoff(now))], row_to_restock)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// The whole restock queue, most recent first
    pub fn all_restock(&self) -> Result<Vec<RestockEntry>, StoreError> {
        let sql = format!("SELECT {RESTOCK_COLUMNS} FROM restock_queue ORDER BY id DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map([], row_to_restock)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Mark an unresolved restock entry as put back on the shelf
    pub fn resolve_restock(&mut self, id: i64, now: DateTime<Utc>) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE restock_queue SET resolved = 1, resolved_at = ?2 WHERE id = ?1 AND resolved = 0",
            params![id, format_datetime(now)],
        )?;
        if changed == 0 {
            return Err(StoreError::RestockNotFound(id));
        }
        log::info!("resolved restock entry {}", id);
        Ok(())
    }

    /// Status counters for the status command
    pub fn stats(&self, policy: &RestockPolicy, now: DateTime<Utc>) -> Result<StoreStats, StoreError> {
        let mut stats = StoreStats::default();

        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM stock_records GROUP BY status")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, Status>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (status, count) = row?;
            let count = count as usize;
            stats.total += count;
            match status {
                Status::Ok => stats.ok += count,
                Status::Short => stats.short += count,
                Status::Over => stats.over += count,
                Status::Damaged => stats.damaged += count,
            }
        }

        let uncounted: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM stock_records WHERE last_counted_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        stats.uncounted = uncounted as usize;

        let pending: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM restock_queue WHERE resolved = 0 AND created_at >= ?1",
            params![format_datetime(policy.cutoff(now))],
            |row| row.get(0),
        )?;
        stats.pending_restock = pending as usize;

        let uploads: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM upload_batches", [], |row| row.get(0))?;
        stats.uploads = uploads as usize;

        Ok(stats)
    }
}
