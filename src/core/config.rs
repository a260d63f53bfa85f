//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::classify::Category;
use crate::core::project::Project;
use crate::core::restock::{
    RestockPolicy, DEFAULT_CATEGORIES, DEFAULT_EXPIRY_DAYS, MAX_EXPIRY_DAYS,
};

/// stockmap configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file; relative paths resolve against the project root
    pub database: Option<PathBuf>,

    /// Categories queued for store restock after a partial upload
    pub restock_categories: Option<Vec<Category>>,

    /// Days an unresolved restock entry stays pending
    pub restock_expiry_days: Option<i64>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/stockmap/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (.stockmap/config.yaml)
        if let Some(project) = project {
            let project_config_path = project.project_dir().join("config.yaml");
            if let Some(project_config) = Self::read_file(&project_config_path) {
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        if let Ok(db) = std::env::var("STOCKMAP_DB") {
            config.database = Some(PathBuf::from(db));
        }
        if let Ok(days) = std::env::var("STOCKMAP_RESTOCK_DAYS") {
            match days.trim().parse() {
                Ok(days) => config.restock_expiry_days = Some(days),
                Err(_) => log::warn!("ignoring STOCKMAP_RESTOCK_DAYS={days:?}: not a number"),
            }
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                log::warn!("could not read {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("ignoring invalid config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "stockmap")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.restock_categories.is_some() {
            self.restock_categories = other.restock_categories;
        }
        if other.restock_expiry_days.is_some() {
            self.restock_expiry_days = other.restock_expiry_days;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Resolve the database file for a project
    pub fn database_path(&self, project: &Project) -> PathBuf {
        match &self.database {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => project.root().join(path),
            None => project.default_database_path(),
        }
    }

    /// Restock policy from the configured categories and window
    pub fn restock_policy(&self) -> RestockPolicy {
        let days = self.restock_expiry_days.unwrap_or(DEFAULT_EXPIRY_DAYS);
        if !(0..=MAX_EXPIRY_DAYS).contains(&days) {
            log::warn!(
                "restock_expiry_days={} is outside 0..={}, clamping",
                days,
                MAX_EXPIRY_DAYS
            );
        }
        RestockPolicy::new(
            self.restock_categories
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORIES.to_vec()),
            days,
        )
    }
}
