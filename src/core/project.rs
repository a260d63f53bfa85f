//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the directory that marks a stockmap project
pub const PROJECT_DIR: &str = ".stockmap";

/// Default database file inside the project directory
pub const DATABASE_FILE: &str = "stock.db";

/// Represents a stockmap project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .stockmap/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current =
            std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Use `root` as the project root without walking up
    pub fn open(root: &Path) -> Result<Self, ProjectError> {
        let root = root
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        if !root.join(PROJECT_DIR).is_dir() {
            return Err(ProjectError::NotFound {
                searched_from: root,
            });
        }
        Ok(Self { root })
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::write_structure(root)
    }

    /// Initialize even if .stockmap/ exists; rewrites the config, keeps the database
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_structure(root)
    }

    fn write_structure(root: PathBuf) -> Result<Self, ProjectError> {
        let dir = root.join(PROJECT_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| ProjectError::IoError(e.to_string()))?;

        std::fs::write(dir.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# stockmap project configuration

# SQLite database file, relative to the project root
# database: .stockmap/stock.db

# Categories queued for store restock after a partial upload
# restock_categories: [lubricants, safety_equipment, farm_accessories]

# Days an unresolved restock entry stays pending
# restock_expiry_days: 7

# Default output format (auto, tsv, csv, json, md)
# default_format: auto
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .stockmap directory
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Default database location
    pub fn default_database_path(&self) -> PathBuf {
        self.project_dir().join(DATABASE_FILE)
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a stockmap project (searched from {searched_from:?}). Run 'stockmap init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("stockmap project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
