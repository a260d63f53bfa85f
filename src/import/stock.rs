//! Stock count sheet layout

use crate::core::classify::classify;
use crate::core::record::{derive_code, ParsedRow};
use crate::core::text::is_placeholder;

use super::{
    cell, clean_note, describe_columns, find_header, header_cells, is_skipped_name,
    parse_quantity, Grid, ImportError, ImportReport, Layout,
};

/// Non-empty values sampled when guessing an unlabeled note column
const NOTE_SAMPLE: usize = 20;

fn is_quantity_header(cell: &str) -> bool {
    cell.contains("QUANTIDADE") || cell == "QTD"
}

/// A stock header has a `PRODUTO` cell and a quantity cell
pub(super) fn is_header(cells: &[String]) -> bool {
    cells.iter().any(|c| c == "PRODUTO") && cells.iter().any(|c| is_quantity_header(c))
}

/// A row naming at least one of the required columns
fn is_partial_header(cells: &[String]) -> bool {
    cells.iter().any(|c| c == "PRODUTO" || is_quantity_header(c))
}

#[derive(Debug, Default)]
struct Columns {
    product: Option<usize>,
    quantity: Option<usize>,
    code: Option<usize>,
    note: Option<usize>,
}

impl Columns {
    /// Each header cell claims at most one role, first match wins
    fn map(header: &[String]) -> Self {
        let mut cols = Columns::default();
        for (idx, name) in header.iter().enumerate() {
            if name == "PRODUTO" && cols.product.is_none() {
                cols.product = Some(idx);
            } else if is_quantity_header(name) && cols.quantity.is_none() {
                cols.quantity = Some(idx);
            } else if (name.contains("CODIGO") || name == "COD") && cols.code.is_none() {
                cols.code = Some(idx);
            } else if ["OBS", "NOTA", "DIFEREN", "ANOTA"]
                .iter()
                .any(|k| name.contains(k))
                && cols.note.is_none()
            {
                cols.note = Some(idx);
            }
        }
        cols
    }

    fn is_used(&self, idx: usize) -> bool {
        [self.product, self.quantity, self.code, self.note].contains(&Some(idx))
    }
}

/// First unused column whose leading values contain letters
fn guess_note_column(columns: &Columns, width: usize, data: &[Vec<String>]) -> Option<usize> {
    (0..width).filter(|idx| !columns.is_used(*idx)).find(|&idx| {
        data.iter()
            .filter_map(|row| row.get(idx))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .take(NOTE_SAMPLE)
            .any(|v| !is_placeholder(v) && v.chars().any(|c| c.is_alphabetic()))
    })
}

pub(super) fn parse(grid: &Grid) -> Result<ImportReport, ImportError> {
    let layout = Layout::Stock;
    // a partial header is kept so the error can name the missing column
    let header_idx = find_header(grid, is_header)
        .or_else(|| find_header(grid, is_partial_header))
        .ok_or(ImportError::HeaderNotFound { layout })?;
    let header = header_cells(&grid[header_idx]);
    let data = &grid[header_idx + 1..];

    let mut columns = Columns::map(&header);
    let (Some(_), Some(_)) = (columns.product, columns.quantity) else {
        return Err(ImportError::MissingColumn {
            layout,
            missing: if columns.product.is_none() {
                "product"
            } else {
                "quantity"
            },
            found: describe_columns(&grid[header_idx]),
        });
    };
    if columns.note.is_none() {
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        columns.note = guess_note_column(&columns, width, data);
        if let Some(idx) = columns.note {
            log::debug!("using unlabeled column {} as the note column", idx + 1);
        }
    }

    let mut rows = Vec::new();
    let mut skipped = 0;

    for (offset, row) in data.iter().enumerate() {
        let line = header_idx + offset + 2;
        let name = cell(row, columns.product);
        if is_skipped_name(name) {
            skipped += 1;
            continue;
        }

        let quantity = match parse_quantity(cell(row, columns.quantity)) {
            Some(q) if q > 0 => q,
            _ => {
                log::debug!("row {}: skipping '{}', no positive quantity", line, name);
                skipped += 1;
                continue;
            }
        };

        let code = match cell(row, columns.code) {
            c if is_placeholder(c) => derive_code(name),
            c => c.to_string(),
        };
        let note = clean_note(cell(row, columns.note));

        rows.push(ParsedRow::from_note(code, name, classify(name), quantity, note));
    }

    if rows.is_empty() {
        return Err(ImportError::NoRows { layout });
    }
    Ok(ImportReport {
        layout,
        rows,
        skipped,
    })
}
