//! `stockmap list`, `divergences` and `damaged` commands

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::Workspace;
use crate::cli::table::{record_row, TableFormatter, RECORD_COLUMNS};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::annotation::Status;
use crate::core::classify::Category;
use crate::core::store::RecordFilter;

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive text to find in the product name or code
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Only this category (e.g. herbicides, seeds, farm_accessories)
    #[arg(long, short = 'c')]
    pub category: Option<Category>,

    /// Only these statuses (ok, short, over, damaged); repeatable
    #[arg(long = "status", value_delimiter = ',')]
    pub statuses: Vec<Status>,

    /// Only products that were never recounted
    #[arg(long)]
    pub uncounted: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShortcutArgs {
    /// Case-insensitive text to find in the product name or code
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Only this category
    #[arg(long, short = 'c')]
    pub category: Option<Category>,
}

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let filter = RecordFilter {
        search: args.search,
        category: args.category,
        statuses: args.statuses,
        uncounted_only: args.uncounted,
    };
    list(&filter, global)
}

pub fn run_divergences(args: ShortcutArgs, global: &GlobalOpts) -> Result<()> {
    let filter = RecordFilter {
        search: args.search,
        category: args.category,
        ..RecordFilter::with_statuses(&[Status::Short, Status::Over, Status::Damaged])
    };
    list(&filter, global)
}

pub fn run_damaged(args: ShortcutArgs, global: &GlobalOpts) -> Result<()> {
    let filter = RecordFilter {
        search: args.search,
        category: args.category,
        ..RecordFilter::with_statuses(&[Status::Damaged])
    };
    list(&filter, global)
}

fn list(filter: &RecordFilter, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let format = ws.format(global);
    let records = ws.db.list_records(filter)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&records).into_diagnostic()?);
        return Ok(());
    }

    if records.is_empty() && format == OutputFormat::Auto {
        if !global.quiet {
            println!("No stock records found.");
            if ws.db.record_count()? == 0 {
                println!();
                println!(
                    "Load a stock count with: {}",
                    style("stockmap upload <FILE> --full").yellow()
                );
            }
        }
        return Ok(());
    }

    let rows: Vec<_> = records.iter().map(record_row).collect();
    let mut formatter = TableFormatter::new(RECORD_COLUMNS, "record");
    if global.quiet {
        formatter = formatter.without_summary();
    }
    formatter.output(&rows, format);
    Ok(())
}
