//! Core module - reconciliation domain, persistence and project layout

pub mod annotation;
pub mod classify;
pub mod config;
pub mod heatmap;
pub mod merge;
pub mod project;
pub mod record;
pub mod restock;
pub mod store;
pub mod text;

pub use annotation::{interpret, Interpretation, ParseOutcome, Status};
pub use classify::{classify, Category};
pub use config::Config;
pub use merge::{merge_batch, MemoryStore, MergeResult, StockStore, Upload};
pub use project::{Project, ProjectError};
pub use record::{ParsedRow, StockRecord, UploadBatch, UploadKind};
pub use restock::{RestockEntry, RestockPolicy};
pub use store::{RecordFilter, StockDb, StoreError, StoreStats};
