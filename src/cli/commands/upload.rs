//! `stockmap upload` and `stockmap preview` commands

use chrono::Utc;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{resolve_format, Workspace};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::merge::{merge_batch, MemoryStore, MergeResult, Upload};
use crate::core::record::{ParsedRow, UploadKind};
use crate::core::Config;
use crate::import::{import_file, ImportReport, Layout};

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    /// Spreadsheet to import (.xlsx, .xls, .ods or .csv)
    pub file: PathBuf,

    /// Replace the whole stock base with this sheet
    #[arg(long, conflicts_with = "partial")]
    pub full: bool,

    /// Update only the products present in this sheet (default)
    #[arg(long)]
    pub partial: bool,

    /// Show what would change without saving
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug)]
pub struct PreviewArgs {
    /// Spreadsheet to parse
    pub file: PathBuf,

    /// Show only rows with a divergence
    #[arg(long)]
    pub divergent: bool,
}

#[derive(Serialize)]
struct UploadOutput<'a> {
    file: String,
    layout: Layout,
    skipped: usize,
    dry_run: bool,
    #[serde(flatten)]
    result: &'a MergeResult,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn run(args: UploadArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = Workspace::open(global)?;
    let format = ws.format(global);
    let kind = if args.full {
        UploadKind::Full
    } else {
        UploadKind::Partial
    };

    let report = import_file(&args.file)?;
    let source = file_name(&args.file);
    let upload = Upload {
        kind,
        source_file_name: &source,
        rows: &report.rows,
    };
    let policy = ws.config.restock_policy();
    let now = Utc::now();

    let result = if args.dry_run {
        let pending = ws.db.all_restock()?.into_iter().filter(|e| !e.resolved);
        let mut store = MemoryStore::with_records(ws.db.all_records()?).with_restock(pending);
        match merge_batch(&mut store, &upload, &policy, now) {
            Ok(result) => result,
            Err(never) => match never {},
        }
    } else {
        ws.db.merge(&upload, &policy, now)?
    };

    if format == OutputFormat::Json {
        let output = UploadOutput {
            file: source,
            layout: report.layout,
            skipped: report.skipped,
            dry_run: args.dry_run,
            result: &result,
        };
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
        return Ok(());
    }

    if global.quiet {
        return Ok(());
    }

    let verb = if args.dry_run { "Would process" } else { "Processed" };
    println!(
        "{} {} {} upload of {} ({} sheet)",
        style("✓").green(),
        verb,
        kind,
        style(&source).cyan(),
        report.layout
    );
    println!("  Processed:  {}", style(result.row_count()).cyan());
    if kind == UploadKind::Partial {
        println!("  Updated:    {}", style(result.updated_count).yellow());
    }
    println!("  New:        {}", style(result.new_count).green());
    println!("  Divergent:  {}", style(result.divergent_count).red());
    if result.restock_count > 0 {
        println!("  Restock:    {}", style(result.restock_count).magenta());
    }
    if report.skipped > 0 {
        println!("  Skipped:    {}", style(report.skipped).dim());
    }
    if args.dry_run {
        println!();
        println!("No changes made (dry run).");
    }
    Ok(())
}

const PREVIEW_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("code", "CODE", 14),
    ColumnDef::new("product", "PRODUCT", 40),
    ColumnDef::new("category", "CATEGORY", 22),
    ColumnDef::new("system", "SYSTEM", 8),
    ColumnDef::new("physical", "PHYSICAL", 8),
    ColumnDef::new("difference", "DIFF", 6),
    ColumnDef::new("status", "STATUS", 8),
    ColumnDef::new("note", "NOTE", 40),
    ColumnDef::new("sold", "SOLD", 6),
];

fn preview_row(row: &ParsedRow) -> Vec<CellValue> {
    vec![
        CellValue::Code(row.code.clone()),
        CellValue::Text(row.product_name.clone()),
        CellValue::Text(row.category.label().to_string()),
        CellValue::Number(row.system_quantity),
        CellValue::Number(row.physical_quantity),
        CellValue::Difference(row.difference),
        CellValue::Status(row.status),
        if row.note.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(row.note.clone())
        },
        row.quantity_sold
            .map(CellValue::Number)
            .unwrap_or(CellValue::Empty),
    ]
}

/// Preview only reads the file, so it works outside a project too
pub fn run_preview(args: PreviewArgs, global: &GlobalOpts) -> Result<()> {
    let configured = crate::core::Project::discover()
        .ok()
        .map(|p| Config::load(Some(&p)))
        .and_then(|c| c.default_format);
    let format = resolve_format(global.format, configured.as_deref());

    let ImportReport {
        layout,
        mut rows,
        skipped,
    } = import_file(&args.file)?;
    if args.divergent {
        rows.retain(ParsedRow::is_divergent);
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
        return Ok(());
    }

    let table_rows: Vec<_> = rows.iter().map(preview_row).collect();
    let formatter = TableFormatter::new(PREVIEW_COLUMNS, "row");
    if format == OutputFormat::Auto && !global.quiet {
        println!(
            "{} {} sheet, {} row(s) parsed, {} skipped",
            style("→").blue(),
            layout,
            rows.len(),
            skipped
        );
        println!();
    }
    formatter.output(&table_rows, format);
    Ok(())
}
