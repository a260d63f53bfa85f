//! stockmap: stock count reconciliation
//!
//! Reads stock count sheets and sales reports, interprets the counters'
//! free-text notes into quantity adjustments and keeps a reconciled stock
//! base in a local SQLite database.

pub mod cli;
pub mod core;
pub mod import;
