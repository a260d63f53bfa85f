//! `stockmap config` command - show the resolved configuration

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::project::Project;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the configuration after merging all layers
    Show,

    /// Show paths to configuration files
    Path,
}

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    let project = match &global.project {
        Some(root) => Project::open(root).ok(),
        None => Project::discover().ok(),
    };
    match cmd {
        ConfigCommands::Show => run_show(project.as_ref(), global),
        ConfigCommands::Path => run_path(project.as_ref()),
    }
}

fn run_show(project: Option<&Project>, global: &GlobalOpts) -> Result<()> {
    let config = Config::load(project);
    let policy = config.restock_policy();

    let resolved = serde_json::json!({
        "database": project.map(|p| config.database_path(p)),
        "restock_categories": policy.categories(),
        "restock_expiry_days": policy.expiry_days(),
        "default_format": config.default_format,
    });

    if global.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&resolved).into_diagnostic()?);
    } else {
        print!("{}", serde_yml::to_string(&resolved).into_diagnostic()?);
    }
    Ok(())
}

fn run_path(project: Option<&Project>) -> Result<()> {
    println!("{}", style("Configuration file paths:").bold());
    println!();

    match Config::global_config_path() {
        Some(path) => {
            println!("  {} {}", style("Global:").cyan(), path.display());
            print_exists(path.exists(), 9);
        }
        None => println!(
            "  {} {}",
            style("Global:").cyan(),
            style("(no home directory)").dim()
        ),
    }

    println!();
    match project {
        Some(project) => {
            let path = project.project_dir().join("config.yaml");
            println!("  {} {}", style("Project:").cyan(), path.display());
            print_exists(path.exists(), 10);
        }
        None => println!(
            "  {} {}",
            style("Project:").cyan(),
            style("(not in a stockmap project)").dim()
        ),
    }
    Ok(())
}

fn print_exists(exists: bool, indent: usize) {
    if exists {
        println!("{}{}", " ".repeat(indent), style("(exists)").green());
    } else {
        println!("{}{}", " ".repeat(indent), style("(not created)").dim());
    }
}
