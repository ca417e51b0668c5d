//! Database handle
//!
//! Opens the configured SQLite file and builds the model registry the
//! commands share.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

use ewsdb_core::ModelRegistry;

use crate::config::Config;
use crate::models::{Author, Book};

/// Registry of every model the CLI persists
pub fn registry() -> Result<ModelRegistry> {
    ModelRegistry::new()
        .with::<Author>()
        .and_then(|r| r.with::<Book>())
        .context("Failed to register models")
}

/// Open the configured database, creating its directory if needed
pub fn open(config: &Config) -> Result<Connection> {
    let path = config.database_path();
    open_path(&path, config)
}

fn open_path(path: &Path, config: &Config) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory: {:?}", parent))?;
        }
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database: {:?}", path))?;

    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .context("Failed to set busy timeout")?;

    debug!(path = %path.display(), "database opened");
    Ok(conn)
}

/// Size of the database file in bytes, if it exists
pub fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|m| m.len())
}
