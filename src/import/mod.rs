//! Spreadsheet import
//!
//! Turns a stock count sheet or a sales report into [`ParsedRow`]s. Header
//! detection and column heuristics live here only; everything downstream
//! works on parsed rows.

mod sales;
mod sheet;
mod stock;

pub use sheet::{read_sheet, Grid};

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use miette::Diagnostic;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::core::record::ParsedRow;
use crate::core::text::{fold_upper, is_placeholder};

/// Rows scanned when sniffing the layout
const DETECT_ROWS: usize = 10;

/// Rows scanned when looking for the header row
const HEADER_SEARCH_ROWS: usize = 15;

/// Spreadsheet layouts the importer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Stock count sheet: product, quantity, optional code and note
    Stock,
    /// Sales report: product group, `code - name`, sold and stock quantities
    Sales,
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layout::Stock => write!(f, "stock"),
            Layout::Sales => write!(f, "sales"),
        }
    }
}

/// Structural problems that abort an import
#[derive(Debug, Error, Diagnostic)]
pub enum ImportError {
    #[error("could not read {path:?}: {message}")]
    #[diagnostic(code(stockmap::import::read))]
    Read { path: PathBuf, message: String },

    #[error("unsupported file type for {path:?}")]
    #[diagnostic(
        code(stockmap::import::file_type),
        help("supported files: .xlsx, .xlsm, .xls, .xlsb, .ods, .csv")
    )]
    UnsupportedFile { path: PathBuf },

    #[error("{path:?} has no sheets")]
    #[diagnostic(code(stockmap::import::no_sheet))]
    NoSheet { path: PathBuf },

    #[error("no {layout} header row in the first 15 rows")]
    #[diagnostic(
        code(stockmap::import::header),
        help(
            "stock sheets need 'Produto' and 'Quantidade' (or 'Qtd') columns; sales reports need 'PRODUTO' plus 'QTDD ESTOQUE' or 'QTDD - VENDIDA'"
        )
    )]
    HeaderNotFound { layout: Layout },

    #[error("{layout} sheet has no {missing} column (detected columns: {found})")]
    #[diagnostic(
        code(stockmap::import::column),
        help(
            "stock sheets need 'Produto' and 'Quantidade' (or 'Qtd') columns; sales reports need 'PRODUTO' plus 'QTDD ESTOQUE' or 'QTDD - VENDIDA'"
        )
    )]
    MissingColumn {
        layout: Layout,
        missing: &'static str,
        found: String,
    },

    #[error("no valid product rows in {layout} sheet")]
    #[diagnostic(
        code(stockmap::import::empty),
        help("rows need a product name and a positive quantity")
    )]
    NoRows { layout: Layout },

    #[error("unrecognized spreadsheet layout")]
    #[diagnostic(
        code(stockmap::import::layout),
        help(
            "stock sheets need 'Produto' and 'Quantidade' (or 'Qtd') columns; sales reports need 'PRODUTO' plus 'QTDD ESTOQUE' or 'QTDD - VENDIDA'"
        )
    )]
    UnrecognizedLayout,
}

/// Result of importing one sheet
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub layout: Layout,
    pub rows: Vec<ParsedRow>,
    /// Data rows dropped by row cleaning
    pub skipped: usize,
}

/// Read and parse a spreadsheet file
pub fn import_file(path: &Path) -> Result<ImportReport, ImportError> {
    let grid = read_sheet(path)?;
    let report = parse_grid(&grid)?;
    log::info!(
        "imported {} sheet {}: {} rows, {} skipped",
        report.layout,
        path.display(),
        report.rows.len(),
        report.skipped
    );
    Ok(report)
}

/// Parse a sheet already read into a grid of trimmed strings
pub fn parse_grid(grid: &Grid) -> Result<ImportReport, ImportError> {
    match detect_layout(grid) {
        Some(Layout::Stock) => stock::parse(grid),
        Some(Layout::Sales) => sales::parse(grid),
        None => stock::parse(grid).or_else(|stock_err| {
            sales::parse(grid).map_err(|_| match stock_err {
                // a stock header was found but is incomplete
                err @ ImportError::MissingColumn { .. } => err,
                _ => ImportError::UnrecognizedLayout,
            })
        }),
    }
}

/// Sniff the layout from the first rows
pub fn detect_layout(grid: &Grid) -> Option<Layout> {
    for row in grid.iter().take(DETECT_ROWS) {
        let cells = header_cells(row);
        let text = cells.join(" ");

        if ["QTDD - VENDIDA", "QTDD ESTOQUE", "GRUPO DE PRODUTO"]
            .iter()
            .any(|marker| text.contains(marker))
        {
            return Some(Layout::Sales);
        }
        if stock::is_header(&cells) {
            return Some(Layout::Stock);
        }
    }
    None
}

/// Uppercased, accent-folded cells used for header matching
fn header_cells(row: &[String]) -> Vec<String> {
    row.iter().map(|c| fold_upper(c.trim())).collect()
}

/// Index of the first of the leading rows accepted by `is_header`
fn find_header(grid: &Grid, is_header: impl Fn(&[String]) -> bool) -> Option<usize> {
    grid.iter()
        .take(HEADER_SEARCH_ROWS)
        .position(|row| is_header(&header_cells(row)))
}

/// Header names for error messages
fn describe_columns(header: &[String]) -> String {
    let names: Vec<&str> = header
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

fn cell(row: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).map(|s| s.trim()).unwrap_or("")
}

/// Names that mark total lines, repeated headers or empty cells
fn is_skipped_name(name: &str) -> bool {
    is_placeholder(name) || matches!(name.to_uppercase().as_str(), "TOTAL" | "PRODUTO" | "ROLLUP")
}

/// Whole-unit quantity from a cell; fractional values are truncated
fn parse_quantity(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let normalized = if raw.contains(',') && !raw.contains('.') {
        raw.replace(',', ".")
    } else {
        raw.replace(',', "")
    };
    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() || value.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(value.trunc() as i64)
}

static NUMERIC_NOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+([.,][0-9]+)?$").expect("valid regex"));

/// Note text worth interpreting; numbers in the note column are cost values
fn clean_note(raw: &str) -> &str {
    let raw = raw.trim();
    if is_placeholder(raw) || NUMERIC_NOTE.is_match(raw) {
        ""
    } else {
        raw
    }
}

#[cfg(test)]
pub(crate) fn grid(rows: &[&[&str]]) -> Grid {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_stock_layout() {
        let g = grid(&[
            &["Relatório de estoque", "", ""],
            &["Código", "Produto", "Quantidade"],
        ]);
        assert_eq!(detect_layout(&g), Some(Layout::Stock));
    }

    #[test]
    fn test_detect_sales_layout() {
        let g = grid(&[&["GRUPO DE PRODUTO", "PRODUTO", "QTDD - VENDIDA", "QTDD ESTOQUE"]]);
        assert_eq!(detect_layout(&g), Some(Layout::Sales));
    }

    #[test]
    fn test_unknown_layout_reports_incomplete_stock_header() {
        let g = grid(&[&["Produto", "Valor"], &["HERBICIDA A", "1"]]);
        assert_eq!(detect_layout(&g), None);
        assert!(matches!(
            parse_grid(&g).unwrap_err(),
            ImportError::MissingColumn {
                layout: Layout::Stock,
                missing: "quantity",
                ..
            }
        ));
    }

    #[test]
    fn test_detect_unknown_layout() {
        let g = grid(&[&["Nome", "Valor"], &["x", "1"]]);
        assert_eq!(detect_layout(&g), None);
        assert!(matches!(
            parse_grid(&g).unwrap_err(),
            ImportError::UnrecognizedLayout
        ));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("12"), Some(12));
        assert_eq!(parse_quantity("12.0"), Some(12));
        assert_eq!(parse_quantity("7,9"), Some(7));
        assert_eq!(parse_quantity("1,200.5"), Some(1200));
        assert_eq!(parse_quantity("-3"), Some(-3));
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("doze"), None);
        assert_eq!(parse_quantity("NaN"), None);
    }

    #[test]
    fn test_clean_note() {
        assert_eq!(clean_note("falta 2"), "falta 2");
        assert_eq!(clean_note("  12,50 "), "");
        assert_eq!(clean_note("300"), "");
        assert_eq!(clean_note("nan"), "");
        assert_eq!(clean_note("12 avariados"), "12 avariados");
    }

    #[test]
    fn test_skipped_names() {
        assert!(is_skipped_name(""));
        assert!(is_skipped_name("Total"));
        assert!(is_skipped_name("ROLLUP"));
        assert!(is_skipped_name("None"));
        assert!(!is_skipped_name("HERBICIDA X"));
    }
}
