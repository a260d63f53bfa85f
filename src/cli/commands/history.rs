//! `stockmap history` command - upload log

use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::Workspace;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::record::UploadBatch;

#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    /// Show only the last N uploads
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

const HISTORY_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 5),
    ColumnDef::new("when", "WHEN", 16),
    ColumnDef::new("kind", "KIND", 8),
    ColumnDef::new("file", "FILE", 32),
    ColumnDef::new("rows", "ROWS", 6),
    ColumnDef::new("new", "NEW", 6),
    ColumnDef::new("updated", "UPDATED", 7),
    ColumnDef::new("divergent", "DIVERGENT", 9),
];

fn batch_row(batch: &UploadBatch) -> Vec<CellValue> {
    vec![
        CellValue::Number(batch.id),
        CellValue::DateTime(batch.timestamp),
        CellValue::Text(batch.kind.to_string()),
        CellValue::Text(batch.source_file_name.clone()),
        CellValue::Number(batch.row_count as i64),
        CellValue::Number(batch.new_count as i64),
        CellValue::Number(batch.updated_count as i64),
        CellValue::Number(batch.divergent_count as i64),
    ]
}

pub fn run(args: HistoryArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let format = ws.format(global);

    let mut batches = ws.db.list_batches()?;
    if let Some(limit) = args.limit {
        batches.truncate(limit);
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&batches).into_diagnostic()?);
        return Ok(());
    }

    if batches.is_empty() && format == OutputFormat::Auto {
        if !global.quiet {
            println!("No uploads yet.");
        }
        return Ok(());
    }

    let rows: Vec<_> = batches.iter().map(batch_row).collect();
    let mut formatter = TableFormatter::new(HISTORY_COLUMNS, "upload");
    if global.quiet {
        formatter = formatter.without_summary();
    }
    formatter.output(&rows, format);
    Ok(())
}
