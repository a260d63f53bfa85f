//! Database schema initialization

use rusqlite::{params, Connection, OptionalExtension};

use super::{StoreError, SCHEMA_VERSION};

/// Create tables if missing and check the schema version
pub(super) fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );

        -- One row per product code
        CREATE TABLE IF NOT EXISTS stock_records (
            code TEXT PRIMARY KEY,
            product_name TEXT NOT NULL,
            category TEXT NOT NULL,
            system_quantity INTEGER NOT NULL DEFAULT 0,
            physical_quantity INTEGER NOT NULL DEFAULT 0,
            difference INTEGER NOT NULL DEFAULT 0,
            note TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'ok',
            last_counted_at TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_stock_records_category ON stock_records(category);
        CREATE INDEX IF NOT EXISTS idx_stock_records_status ON stock_records(status);

        -- Append-only upload log
        CREATE TABLE IF NOT EXISTS upload_batches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            kind TEXT NOT NULL,
            source_file_name TEXT NOT NULL DEFAULT '',
            row_count INTEGER NOT NULL DEFAULT 0,
            new_count INTEGER NOT NULL DEFAULT 0,
            updated_count INTEGER NOT NULL DEFAULT 0,
            divergent_count INTEGER NOT NULL DEFAULT 0
        );

        -- Store-floor restock queue
        CREATE TABLE IF NOT EXISTS restock_queue (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL,
            product_name TEXT NOT NULL,
            category TEXT NOT NULL,
            quantity_sold INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            resolved INTEGER NOT NULL DEFAULT 0,
            resolved_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_restock_queue_code ON restock_queue(code, resolved);
        "#,
    )?;

    let found: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .optional()?
        .flatten();

    match found {
        None => {
            log::info!("initialized stock database schema v{}", SCHEMA_VERSION);
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;
            Ok(())
        }
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(version) => Err(StoreError::SchemaVersion {
            found: version,
            expected: SCHEMA_VERSION,
        }),
    }
}
