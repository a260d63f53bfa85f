//! `stockmap restock` command - store-floor restock queue

use chrono::Utc;
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::Workspace;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::restock::{RestockEntry, RestockPolicy};

#[derive(Subcommand, Debug)]
pub enum RestockCommands {
    /// List items waiting to go back on the shelves
    List(RestockListArgs),

    /// Mark an entry as restocked
    Resolve(ResolveArgs),
}

#[derive(clap::Args, Debug)]
pub struct RestockListArgs {
    /// Include resolved and expired entries
    #[arg(long, short = 'a')]
    pub all: bool,
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    /// Entry id (from `stockmap restock list`)
    pub id: i64,
}

const RESTOCK_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 5),
    ColumnDef::new("code", "CODE", 14),
    ColumnDef::new("product", "PRODUCT", 40),
    ColumnDef::new("category", "CATEGORY", 22),
    ColumnDef::new("sold", "SOLD", 6),
    ColumnDef::new("created", "CREATED", 16),
    ColumnDef::new("state", "STATE", 9),
];

pub fn run(cmd: RestockCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        RestockCommands::List(args) => run_list(args, global),
        RestockCommands::Resolve(args) => run_resolve(args, global),
    }
}

fn entry_state(entry: &RestockEntry, policy: &RestockPolicy, now: chrono::DateTime<Utc>) -> &'static str {
    if entry.resolved {
        "resolved"
    } else if policy.is_pending(entry, now) {
        "pending"
    } else {
        "expired"
    }
}

fn run_list(args: RestockListArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let format = ws.format(global);
    let policy = ws.config.restock_policy();
    let now = Utc::now();

    let entries = if args.all {
        ws.db.all_restock()?
    } else {
        ws.db.pending_restock(&policy, now)?
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&entries).into_diagnostic()?);
        return Ok(());
    }

    if entries.is_empty() && format == OutputFormat::Auto {
        if !global.quiet {
            println!("Nothing waiting for restock.");
        }
        return Ok(());
    }

    let rows: Vec<Vec<CellValue>> = entries
        .iter()
        .map(|e| {
            vec![
                CellValue::Number(e.id),
                CellValue::Code(e.code.clone()),
                CellValue::Text(e.product_name.clone()),
                CellValue::Text(e.category.label().to_string()),
                CellValue::Number(e.quantity_sold),
                CellValue::DateTime(e.created_at),
                CellValue::Text(entry_state(e, &policy, now).to_string()),
            ]
        })
        .collect();

    let mut formatter = TableFormatter::new(RESTOCK_COLUMNS, "entry");
    if global.quiet {
        formatter = formatter.without_summary();
    }
    formatter.output(&rows, format);
    Ok(())
}

fn run_resolve(args: ResolveArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = Workspace::open(global)?;
    ws.db.resolve_restock(args.id, Utc::now())?;

    if !global.quiet {
        println!(
            "{} Restock entry {} resolved",
            style("✓").green(),
            style(args.id).cyan()
        );
    }
    Ok(())
}
