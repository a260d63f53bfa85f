//! Table formatting for list commands
//!
//! Rows are built from typed cells so each output format can render them its
//! own way: aligned and colored for the terminal, plain for TSV/CSV, escaped
//! for Markdown.

use chrono::{DateTime, Local, Utc};
use console::{style, StyledObject};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;
use crate::core::annotation::Status;
use crate::core::record::StockRecord;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Product code (cyan)
    Code(String),
    /// Plain text, truncated to the column width
    Text(String),
    /// Reconciliation status with color coding
    Status(Status),
    /// Signed quantity difference (red below zero, yellow above)
    Difference(i64),
    Number(i64),
    /// DateTime displayed in local time
    DateTime(DateTime<Utc>),
    /// Empty/placeholder
    Empty,
}

/// Terminal styling for a status, shared by tables and the heat map
pub fn style_status<D>(status: Status, value: D) -> StyledObject<D> {
    match status {
        Status::Ok => style(value).green(),
        Status::Short => style(value).red(),
        Status::Over => style(value).yellow(),
        Status::Damaged => style(value).magenta(),
    }
}

impl CellValue {
    /// Plain text value, no colors or escaping
    pub fn raw(&self) -> String {
        match self {
            CellValue::Code(s) | CellValue::Text(s) => s.clone(),
            CellValue::Status(status) => status.to_string(),
            CellValue::Difference(n) if *n > 0 => format!("+{}", n),
            CellValue::Difference(n) | CellValue::Number(n) => n.to_string(),
            CellValue::DateTime(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%d %H:%M").to_string()
            }
            CellValue::Empty => String::new(),
        }
    }

    /// Aligned, colored terminal cell
    pub fn format_auto(&self, width: usize) -> String {
        match self {
            CellValue::Code(s) => format!("{:<width$}", style(s).cyan(), width = width),
            CellValue::Text(s) => {
                let truncated = truncate_str(s, width);
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Status(status) => {
                format!("{:<width$}", style_status(*status, status.as_str()), width = width)
            }
            CellValue::Difference(n) => {
                let text = self.raw();
                let styled = match n {
                    n if *n < 0 => style(text).red(),
                    n if *n > 0 => style(text).yellow(),
                    _ => style(text).dim(),
                };
                format!("{:>width$}", styled, width = width)
            }
            CellValue::Number(n) => format!("{:>width$}", n, width = width),
            CellValue::DateTime(_) => format!("{:<width$}", self.raw(), width = width),
            CellValue::Empty => format!("{:<width$}", style("-").dim(), width = width),
        }
    }

    /// Width of the plain text, used for column sizing
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// Table formatter for one kind of row
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    item_name: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], item_name: &'static str) -> Self {
        Self {
            columns,
            item_name,
            show_summary: true,
        }
    }

    /// Drop the "N item(s)" line after the table
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// Print rows in the given format; JSON is handled by the caller
    pub fn output(&self, rows: &[Vec<CellValue>], format: OutputFormat) {
        print!("{}", self.render(rows, format));
    }

    pub fn render(&self, rows: &[Vec<CellValue>], format: OutputFormat) -> String {
        match format {
            OutputFormat::Tsv => self.render_delimited(rows, "\t", CellValue::raw),
            OutputFormat::Csv => self.render_delimited(rows, ",", |c| escape_csv(&c.raw())),
            OutputFormat::Md => self.render_md(rows),
            OutputFormat::Auto | OutputFormat::Json => self.render_auto(rows),
        }
    }

    fn widths(&self, rows: &[Vec<CellValue>]) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(CellValue::display_width)
                    .max()
                    .unwrap_or(0);
                col.header.len().max(content.min(col.width))
            })
            .collect()
    }

    fn render_auto(&self, rows: &[Vec<CellValue>]) -> String {
        let widths = self.widths(rows);
        let mut out = String::new();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = *w))
            .collect();
        out.push_str(header.join("  ").trim_end());
        out.push('\n');

        let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total));
        out.push('\n');

        for row in rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| cell.format_auto(*w))
                .collect();
            out.push_str(cells.join("  ").trim_end());
            out.push('\n');
        }

        if self.show_summary {
            out.push('\n');
            out.push_str(&format!(
                "{} {}(s) found.\n",
                style(rows.len()).cyan(),
                self.item_name
            ));
        }
        out
    }

    fn render_delimited(
        &self,
        rows: &[Vec<CellValue>],
        separator: &str,
        cell: impl Fn(&CellValue) -> String,
    ) -> String {
        let mut out = String::new();
        let keys: Vec<&str> = self.columns.iter().map(|c| c.key).collect();
        out.push_str(&keys.join(separator));
        out.push('\n');
        for row in rows {
            let values: Vec<String> = row.iter().map(&cell).collect();
            out.push_str(&values.join(separator));
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[Vec<CellValue>]) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().map(|c| c.header.to_string()));
        for row in rows {
            builder.push_record(row.iter().map(|c| match c {
                CellValue::Empty => "-".to_string(),
                other => other.raw().replace('|', "\\|"),
            }));
        }
        let mut table = builder.build();
        table.with(Style::markdown());
        format!("{}\n", table)
    }
}

/// Columns of the stock record listing
pub const RECORD_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("code", "CODE", 14),
    ColumnDef::new("product", "PRODUCT", 40),
    ColumnDef::new("category", "CATEGORY", 22),
    ColumnDef::new("system", "SYSTEM", 8),
    ColumnDef::new("physical", "PHYSICAL", 8),
    ColumnDef::new("difference", "DIFF", 6),
    ColumnDef::new("status", "STATUS", 8),
    ColumnDef::new("note", "NOTE", 40),
    ColumnDef::new("counted", "COUNTED", 16),
];

/// Cells of one stock record, in [`RECORD_COLUMNS`] order
pub fn record_row(record: &StockRecord) -> Vec<CellValue> {
    vec![
        CellValue::Code(record.code.clone()),
        CellValue::Text(record.product_name.clone()),
        CellValue::Text(record.category.label().to_string()),
        CellValue::Number(record.system_quantity),
        CellValue::Number(record.physical_quantity),
        CellValue::Difference(record.difference),
        CellValue::Status(record.status),
        if record.note.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(record.note.clone())
        },
        record
            .last_counted_at
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Empty),
    ]
}
