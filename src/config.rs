use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;

use crate::db::{Database, IntegrityOptions};
use crate::ingest::OnError;

/// Ingestion settings, read from `astrodb.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Directory holding one JSON data file per table.
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Write the tables back after ingesting.
    #[serde(default)]
    pub save_db: bool,
    /// Start from empty tables instead of the existing data files.
    #[serde(default)]
    pub recreate_db: bool,
    #[serde(default)]
    pub integrity: IntegrityOptions,
    #[serde(default)]
    pub on_error: OnError,
}

fn default_database() -> PathBuf {
    PathBuf::from("data")
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: default_database(),
            save_db: false,
            recreate_db: false,
            integrity: IntegrityOptions::default(),
            on_error: OnError::default(),
        }
    }
}

impl Config {
    /// Read the config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("{} not found, using default settings", path.display());
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Open the database described by this config.
    pub fn open_database(&self) -> Result<Database> {
        if self.recreate_db {
            info!("Recreating database from scratch");
            return Ok(Database::new(self.integrity));
        }
        Database::load(&self.database, self.integrity)
            .with_context(|| format!("loading database from {}", self.database.display()))
    }
}
