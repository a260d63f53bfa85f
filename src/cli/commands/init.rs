//! `stockmap init` command - Initialize a new stockmap project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::core::project::{Project, ProjectError};
use crate::core::store::StockDb;
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Rewrite the project config even if .stockmap/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        if !global.quiet {
            println!(
                "{} Created directory {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            let config = Config::load(Some(&project));
            let db_path = config.database_path(&project);
            StockDb::open(&db_path)?;

            if global.quiet {
                return Ok(());
            }
            println!(
                "{} Initialized stockmap project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Created project structure:");
            println!("  {}/", style(".stockmap").blue());
            println!("    config.yaml");
            println!("  database: {}", style(db_path.display()).dim());
            println!();
            println!("Next steps:");
            println!(
                "  {} Load the full stock count",
                style("stockmap upload estoque.xlsx --full").yellow()
            );
            println!(
                "  {} Merge a partial count or sales report",
                style("stockmap upload vendas.xlsx").yellow()
            );
            println!("  {} Show the heat map", style("stockmap map").yellow());
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} stockmap project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("stockmap init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}
