//! Shared helper functions for CLI commands

use miette::Result;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::project::Project;
use crate::core::store::StockDb;
use crate::core::Config;

/// Truncate a string to `max_len` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Project, configuration and database for a command run
pub struct Workspace {
    pub project: Project,
    pub config: Config,
    pub db: StockDb,
}

impl Workspace {
    /// Locate the project (from `--project` or the current directory) and
    /// open its database
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let project = match &global.project {
            Some(root) => Project::open(root),
            None => Project::discover(),
        }
        .map_err(|e| miette::miette!("{}", e))?;

        let config = Config::load(Some(&project));
        let db_path = config.database_path(&project);
        log::debug!("using database {}", db_path.display());
        let db = StockDb::open(&db_path)?;

        Ok(Self {
            project,
            config,
            db,
        })
    }

    /// Output format after applying the configured default
    pub fn format(&self, global: &GlobalOpts) -> OutputFormat {
        resolve_format(global.format, self.config.default_format.as_deref())
    }
}

/// `--format auto` defers to the configured default, if it names a format
pub fn resolve_format(requested: OutputFormat, configured: Option<&str>) -> OutputFormat {
    if requested != OutputFormat::Auto {
        return requested;
    }
    configured
        .and_then(|name| <OutputFormat as clap::ValueEnum>::from_str(name, true).ok())
        .unwrap_or(OutputFormat::Auto)
}
