//! Store type definitions
//!
//! Filters, statistics, the store error and SQL conversions for domain enums.

use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use miette::Diagnostic;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;
use thiserror::Error;

use crate::core::annotation::Status;
use crate::core::classify::Category;
use crate::core::record::UploadKind;

/// Errors raised by the SQLite store
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("database error: {0}")]
    #[diagnostic(code(stockmap::store::sqlite))]
    Sqlite(#[from] rusqlite::Error),

    #[error("could not prepare database location {path:?}: {message}")]
    #[diagnostic(code(stockmap::store::io))]
    Io { path: PathBuf, message: String },

    #[error("database uses schema version {found}, this build expects {expected}")]
    #[diagnostic(
        code(stockmap::store::schema_version),
        help("move the old database aside or point `database:` in .stockmap/config.yaml at a new file")
    )]
    SchemaVersion { found: i32, expected: i32 },

    #[error("restock entry {0} does not exist or is already resolved")]
    #[diagnostic(
        code(stockmap::store::restock_not_found),
        help("run `stockmap restock list --all` to see entry ids")
    )]
    RestockNotFound(i64),
}

/// Filter for listing stock records
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Case-insensitive substring of product name or code
    pub search: Option<String>,
    pub category: Option<Category>,
    /// Empty means any status
    pub statuses: Vec<Status>,
    /// Only records that were never recounted
    pub uncounted_only: bool,
}

impl RecordFilter {
    pub fn with_statuses(statuses: &[Status]) -> Self {
        Self {
            statuses: statuses.to_vec(),
            ..Self::default()
        }
    }
}

/// Summary counters over the current record set
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub ok: usize,
    pub short: usize,
    pub over: usize,
    pub damaged: usize,
    pub uncounted: usize,
    pub pending_restock: usize,
    pub uploads: usize,
}

impl StoreStats {
    pub fn divergent(&self) -> usize {
        self.short + self.over + self.damaged
    }
}

/// Timestamps are stored as fixed-width RFC 3339 text so they sort as strings
pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_datetime(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

pub(crate) fn get_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    parse_datetime(idx, &s)
}

pub(crate) fn get_optional_datetime(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(s) if !s.trim().is_empty() => parse_datetime(idx, &s).map(Some),
        _ => Ok(None),
    }
}

fn parse_text<T>(value: ValueRef<'_>) -> FromSqlResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .as_str()?
        .parse()
        .map_err(|e: String| FromSqlError::Other(e.into()))
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        parse_text(value)
    }
}

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        parse_text(value)
    }
}

impl ToSql for UploadKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for UploadKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        parse_text(value)
    }
}
