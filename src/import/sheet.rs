//! Reading the first sheet of a workbook or a CSV file into a string grid

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use super::ImportError;

/// Rows of trimmed cell text
pub type Grid = Vec<Vec<String>>;

/// Lines inspected when choosing the CSV delimiter
const DELIMITER_SAMPLE_LINES: usize = 10;

/// Read the first sheet of `path`
pub fn read_sheet(path: &Path) -> Result<Grid, ImportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" | "txt" => read_csv(path),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path),
        _ => Err(ImportError::UnsupportedFile {
            path: path.to_path_buf(),
        }),
    }
}

fn read_error(path: &Path, err: impl std::fmt::Display) -> ImportError {
    ImportError::Read {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn read_workbook(path: &Path) -> Result<Grid, ImportError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| read_error(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::NoSheet {
            path: path.to_path_buf(),
        })?
        .map_err(|e| read_error(path, e))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

/// Render a cell the way it reads in the sheet; whole floats lose their `.0`
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Int(i) => i.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn read_csv(path: &Path) -> Result<Grid, ImportError> {
    let bytes = std::fs::read(path).map_err(|e| read_error(path, e))?;
    Ok(parse_csv(&decode(&bytes)))
}

/// UTF-8 with an optional BOM; anything else is taken as Latin-1
fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// `;` when it outnumbers `,` in the leading lines, as spreadsheet exports in
/// comma-decimal locales do
fn detect_delimiter(content: &str) -> u8 {
    let (semicolons, commas) = content
        .lines()
        .take(DELIMITER_SAMPLE_LINES)
        .fold((0, 0), |(s, c), line| {
            (s + line.matches(';').count(), c + line.matches(',').count())
        });
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn parse_csv(content: &str) -> Grid {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(detect_delimiter(content))
        .from_reader(content.as_bytes());

    reader
        .records()
        .filter_map(|record| match record {
            Ok(record) => Some(record.iter().map(|c| c.trim().to_string()).collect()),
            Err(e) => {
                log::debug!("skipping unreadable CSV line: {}", e);
                None
            }
        })
        .collect()
}
