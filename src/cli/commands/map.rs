//! `stockmap map` command - terminal heat map of the stock base

use chrono::Utc;
use console::{style, Term};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::{truncate_str, Workspace};
use crate::cli::table::style_status;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::classify::Category;
use crate::core::heatmap::{self, CategoryBlock, Summary, Tile};
use crate::core::restock::RestockEntry;
use crate::core::store::RecordFilter;

const TILE_WIDTH: usize = 18;

#[derive(clap::Args, Debug)]
pub struct MapArgs {
    /// Only this category
    #[arg(long, short = 'c')]
    pub category: Option<Category>,

    /// Case-insensitive text to find in the product name or code
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Show only divergent tiles
    #[arg(long)]
    pub divergent: bool,
}

#[derive(Serialize)]
struct MapOutput<'a> {
    summary: &'a Summary,
    pending_restock: &'a [RestockEntry],
    blocks: &'a [CategoryBlock],
}

pub fn run(args: MapArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let format = ws.format(global);

    let filter = RecordFilter {
        search: args.search,
        category: args.category,
        ..RecordFilter::default()
    };
    let mut records = ws.db.list_records(&filter)?;
    let summary = Summary::from_records(&records);
    if args.divergent {
        records.retain(|r| r.is_divergent());
    }
    let blocks = heatmap::build(&records);
    let pending = ws
        .db
        .pending_restock(&ws.config.restock_policy(), Utc::now())?;

    if format == OutputFormat::Json {
        let output = MapOutput {
            summary: &summary,
            pending_restock: &pending,
            blocks: &blocks,
        };
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
        return Ok(());
    }

    if summary.total == 0 {
        println!("No stock records found.");
        return Ok(());
    }

    if !global.quiet {
        print_summary(&summary, pending.len());
    }

    let (_, cols) = Term::stdout().size();
    let per_line = (usize::from(cols) / (TILE_WIDTH + 1)).max(1);

    for block in &blocks {
        println!();
        println!(
            "{} {}",
            style(block.category.label().to_uppercase()).bold(),
            style(format!(
                "({} products, {} units)",
                block.tiles.len(),
                block.total_system_quantity
            ))
            .dim()
        );
        for line in block.tiles.chunks(per_line) {
            let labels: Vec<String> = line.iter().map(|t| tile_cell(t, &t.label)).collect();
            let infos: Vec<String> = line.iter().map(|t| tile_cell(t, &t.info)).collect();
            println!("{}", labels.join(" "));
            println!("{}", infos.join(" "));
        }
    }
    Ok(())
}

fn print_summary(summary: &Summary, pending_restock: usize) {
    println!("{}", style("Stock map").bold().underlined());
    println!(
        "  {} products   {} ok   {} short   {} over   {} damaged",
        style(summary.total).cyan(),
        style(summary.ok).green(),
        style(summary.short).red(),
        style(summary.over).yellow(),
        style(summary.damaged).magenta()
    );
    if summary.uncounted > 0 {
        println!(
            "  {} never recounted (dimmed)",
            style(summary.uncounted).dim()
        );
    }
    if pending_restock > 0 {
        println!(
            "  {} waiting for restock (see {})",
            style(pending_restock).magenta(),
            style("stockmap restock list").yellow()
        );
    }
}

fn tile_cell(tile: &Tile, text: &str) -> String {
    let text = truncate_str(text, TILE_WIDTH);
    let styled = style_status(tile.status, format!("{:<width$}", text, width = TILE_WIDTH));
    if tile.counted {
        styled.to_string()
    } else {
        styled.dim().to_string()
    }
}
