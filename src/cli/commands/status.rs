//! `stockmap status` command - stock base dashboard

use chrono::Utc;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::Workspace;
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct StatusArgs {}

pub fn run(_args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let stats = ws.db.stats(&ws.config.restock_policy(), Utc::now())?;
    let last_upload = ws.db.list_batches()?.into_iter().next();

    if ws.format(global) == OutputFormat::Json {
        let status = serde_json::json!({
            "project": ws.project.root(),
            "database": ws.db.path(),
            "stats": stats,
            "last_upload": last_upload,
        });
        println!("{}", serde_json::to_string_pretty(&status).into_diagnostic()?);
        return Ok(());
    }

    let width = 40;
    println!("{}", style("Stock Status").bold().underlined());
    println!("{}", "═".repeat(width));
    if let Some(path) = ws.db.path() {
        println!("  {:<12} {}", "Database:", style(path.display()).dim());
    }
    println!();
    println!("  {:<12} {}", "Products:", style(stats.total).cyan());
    println!("  {:<12} {}", "OK:", style(stats.ok).green());
    println!("  {:<12} {}", "Short:", style(stats.short).red());
    println!("  {:<12} {}", "Over:", style(stats.over).yellow());
    println!("  {:<12} {}", "Damaged:", style(stats.damaged).magenta());
    println!("  {:<12} {}", "Uncounted:", style(stats.uncounted).dim());
    println!();
    println!("  {:<12} {}", "Divergent:", style(stats.divergent()).red());
    println!("  {:<12} {}", "Restock:", style(stats.pending_restock).magenta());
    println!("  {:<12} {}", "Uploads:", stats.uploads);

    if let Some(batch) = last_upload {
        println!();
        println!(
            "Last upload: {} {} ({})",
            batch.kind,
            style(&batch.source_file_name).cyan(),
            batch
                .timestamp
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}
