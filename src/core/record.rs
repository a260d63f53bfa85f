//! Stock records, parsed rows and the upload log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::annotation::{interpret, Status};
use crate::core::classify::Category;
use crate::core::text::fold_upper;

/// Prefix of codes derived from product names
pub const AUTO_CODE_PREFIX: &str = "AUTO_";

/// Maximum number of name characters kept in a derived code
const AUTO_CODE_NAME_LEN: usize = 20;

/// Derive a product code from its name when the sheet has none
///
/// Uppercases the name, drops everything outside `[A-Z0-9]` and keeps the
/// first 20 characters: `"Herbicida Roundup"` becomes `AUTO_HERBICIDAROUNDUP`.
pub fn derive_code(product_name: &str) -> String {
    let stem: String = fold_upper(product_name)
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .take(AUTO_CODE_NAME_LEN)
        .collect();
    format!("{}{}", AUTO_CODE_PREFIX, stem)
}

/// One product line as produced by the spreadsheet importer
///
/// Quantities and status are already computed from the note, so the merge
/// never looks at raw annotation text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRow {
    pub code: String,
    pub product_name: String,
    pub category: Category,
    pub system_quantity: i64,
    pub physical_quantity: i64,
    pub difference: i64,
    pub note: String,
    pub status: Status,
    /// Units sold, only present in sales reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_sold: Option<i64>,
}

impl ParsedRow {
    /// Build a row by interpreting `raw_note` against `system_quantity`
    pub fn from_note(
        code: impl Into<String>,
        product_name: impl Into<String>,
        category: Category,
        system_quantity: i64,
        raw_note: &str,
    ) -> Self {
        let interpretation = interpret(raw_note, system_quantity);
        Self {
            code: code.into(),
            product_name: product_name.into(),
            category,
            system_quantity,
            physical_quantity: interpretation.physical_quantity,
            difference: interpretation.difference,
            note: interpretation.observation,
            status: interpretation.status,
            quantity_sold: None,
        }
    }

    pub fn with_quantity_sold(mut self, quantity_sold: i64) -> Self {
        self.quantity_sold = Some(quantity_sold);
        self
    }

    pub fn is_divergent(&self) -> bool {
        self.status.is_divergent()
    }
}

/// Current reconciled state of one product, keyed by `code`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub code: String,
    pub product_name: String,
    pub category: Category,
    pub system_quantity: i64,
    pub physical_quantity: i64,
    pub difference: i64,
    pub note: String,
    pub status: Status,
    /// `None` means the product was never recounted
    pub last_counted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl StockRecord {
    /// New record from a parsed row, counted at `now`
    pub fn from_row(row: &ParsedRow, now: DateTime<Utc>) -> Self {
        Self {
            code: row.code.clone(),
            product_name: row.product_name.clone(),
            category: row.category,
            system_quantity: row.system_quantity,
            physical_quantity: row.physical_quantity,
            difference: row.difference,
            note: row.note.clone(),
            status: row.status,
            last_counted_at: Some(now),
            created_at: now,
        }
    }

    /// Overwrite every counted field from `row`; `code` and `created_at` stay
    pub fn apply_row(&mut self, row: &ParsedRow, now: DateTime<Utc>) {
        self.product_name = row.product_name.clone();
        self.category = row.category;
        self.system_quantity = row.system_quantity;
        self.physical_quantity = row.physical_quantity;
        self.difference = row.difference;
        self.note = row.note.clone();
        self.status = row.status;
        self.last_counted_at = Some(now);
    }

    pub fn is_divergent(&self) -> bool {
        self.status.is_divergent()
    }

    pub fn is_counted(&self) -> bool {
        self.last_counted_at.is_some()
    }
}

/// Kind of upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    /// Replaces the whole record set
    Full,
    /// Upserts only the rows present
    Partial,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Full => "full",
            UploadKind::Partial => "partial",
        }
    }
}

impl std::fmt::Display for UploadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UploadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(UploadKind::Full),
            "partial" => Ok(UploadKind::Partial),
            _ => Err(format!("Unknown upload kind: {}", s)),
        }
    }
}

/// One processed upload, as kept in the append-only upload log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadBatch {
    /// Assigned by the store; `0` until appended
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub kind: UploadKind,
    pub source_file_name: String,
    pub row_count: usize,
    pub new_count: usize,
    pub updated_count: usize,
    pub divergent_count: usize,
}
