//! SQLite-backed stock store
//!
//! Holds the reconciled stock records, the append-only upload log and the
//! restock queue. A merge runs inside one transaction, so a failed upload
//! leaves the previous state untouched.

mod queries;
mod schema;
mod types;

pub use types::*;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::core::merge::{merge_batch, MergeResult, StockStore, Upload};
use crate::core::record::{StockRecord, UploadBatch};
use crate::core::restock::{RestockEntry, RestockPolicy};

/// Current schema version; a database with another version is refused
pub const SCHEMA_VERSION: i32 = 1;

pub(crate) const RECORD_COLUMNS: &str = "code, product_name, category, system_quantity, \
     physical_quantity, difference, note, status, last_counted_at, created_at";

/// The stock database
pub struct StockDb {
    conn: Connection,
    path: Option<PathBuf>,
}

impl StockDb {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        schema::init_schema(&conn)?;

        log::debug!("opened stock database {}", path.display());
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Throwaway database, used by tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    /// File backing this database, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Merge an upload atomically
    pub fn merge(
        &mut self,
        upload: &Upload<'_>,
        policy: &RestockPolicy,
        now: DateTime<Utc>,
    ) -> Result<MergeResult, StoreError> {
        let tx = self.conn.transaction()?;
        let result = {
            let mut store = SqlStore::new(&tx);
            merge_batch(&mut store, upload, policy, now)?
        };
        tx.commit()?;
        Ok(result)
    }

    /// Look up one record by code
    pub fn get_record(&self, code: &str) -> Result<Option<StockRecord>, StoreError> {
        SqlStore::new(&self.conn).get(code)
    }

    /// Delete every record, batch and restock entry; the schema stays
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            DELETE FROM stock_records;
            DELETE FROM upload_batches;
            DELETE FROM restock_queue;
            DELETE FROM sqlite_sequence WHERE name IN ('upload_batches', 'restock_queue');
            "#,
        )?;
        log::info!("reset stock database");
        Ok(())
    }
}

/// [`StockStore`] over a borrowed connection or transaction
pub struct SqlStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqlStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl StockStore for SqlStore<'_> {
    type Error = StoreError;

    fn get(&self, code: &str) -> Result<Option<StockRecord>, StoreError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM stock_records WHERE code = ?1");
        let record = self
            .conn
            .query_row(&sql, params![code], queries::row_to_record)
            .optional()?;
        Ok(record)
    }

    fn insert(&mut self, record: StockRecord) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO stock_records ({RECORD_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        );
        self.conn.execute(
            &sql,
            params![
                record.code,
                record.product_name,
                record.category,
                record.system_quantity,
                record.physical_quantity,
                record.difference,
                record.note,
                record.status,
                record.last_counted_at.map(format_datetime),
                format_datetime(record.created_at),
            ],
        )?;
        Ok(())
    }

    fn update(&mut self, record: StockRecord) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE stock_records SET product_name = ?2, category = ?3, system_quantity = ?4, \
             physical_quantity = ?5, difference = ?6, note = ?7, status = ?8, \
             last_counted_at = ?9 WHERE code = ?1",
            params![
                record.code,
                record.product_name,
                record.category,
                record.system_quantity,
                record.physical_quantity,
                record.difference,
                record.note,
                record.status,
                record.last_counted_at.map(format_datetime),
            ],
        )?;
        Ok(())
    }

    fn clear_records(&mut self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM stock_records", [])?;
        Ok(())
    }

    fn append_batch(&mut self, batch: &UploadBatch) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO upload_batches (timestamp, kind, source_file_name, row_count, \
             new_count, updated_count, divergent_count) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                format_datetime(batch.timestamp),
                batch.kind,
                batch.source_file_name,
                batch.row_count as i64,
                batch.new_count as i64,
                batch.updated_count as i64,
                batch.divergent_count as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn has_unresolved_restock(&self, code: &str) -> Result<bool, StoreError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM restock_queue WHERE code = ?1 AND resolved = 0)",
            params![code],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn push_restock(&mut self, entry: &RestockEntry) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO restock_queue (code, product_name, category, quantity_sold, \
             created_at, resolved, resolved_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.code,
                entry.product_name,
                entry.category,
                entry.quantity_sold,
                format_datetime(entry.created_at),
                entry.resolved,
                entry.resolved_at.map(format_datetime),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}
