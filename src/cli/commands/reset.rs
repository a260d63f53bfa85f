//! `stockmap reset` command - wipe the stock base

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::Workspace;
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct ResetArgs {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(args: ResetArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = Workspace::open(global)?;
    let records = ws.db.record_count()?;

    if !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Delete {} record(s), the upload log and the restock queue?",
                records
            ))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    ws.db.reset()?;
    if !global.quiet {
        println!(
            "{} Stock base cleared ({} record(s) removed)",
            style("✓").green(),
            records
        );
    }
    Ok(())
}
