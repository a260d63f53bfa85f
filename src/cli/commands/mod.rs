//! CLI command implementations

pub mod completions;
pub mod config;
pub mod history;
pub mod init;
pub mod list;
pub mod map;
pub mod reset;
pub mod restock;
pub mod status;
pub mod upload;
