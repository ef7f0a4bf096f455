use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::model::{Record, TableName};
use super::{with_table, Database, IntegrityOptions, Table};
use crate::error::{IngestError, Result};

/// Path of the data file holding one table.
pub fn table_path(dir: &Path, table: TableName) -> PathBuf {
    dir.join(format!("{table}.json"))
}

impl Database {
    /// Write every table to `<dir>/<TableName>.json`, creating `dir` if needed.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|source| IngestError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for table in TableName::ALL {
            let path = table_path(dir, table);
            let text = with_table!(self, table, |t| serde_json::to_string_pretty(t))
                .map_err(|source| IngestError::Json {
                    path: path.clone(),
                    source,
                })?;
            fs::write(&path, text).map_err(|source| IngestError::Io {
                path: path.clone(),
                source,
            })?;
            debug!("wrote {}", path.display());
        }
        info!("Saved database to {}", dir.display());
        Ok(())
    }

    /// Read a database saved by [`Database::save`]. Missing table files
    /// load as empty tables.
    pub fn load(dir: &Path, options: IntegrityOptions) -> Result<Self> {
        let db = Database {
            options,
            publications: load_table(dir)?,
            sources: load_table(dir)?,
            names: load_table(dir)?,
            spectral_types: load_table(dir)?,
            companion_relationships: load_table(dir)?,
            photometry: load_table(dir)?,
            proper_motions: load_table(dir)?,
            parallaxes: load_table(dir)?,
            spectra: load_table(dir)?,
            modeled_parameters: load_table(dir)?,
        };
        info!(
            "Loaded database from {} ({} sources)",
            dir.display(),
            db.sources.len()
        );
        Ok(db)
    }
}

fn load_table<R: Record>(dir: &Path) -> Result<Table<R>> {
    let path = table_path(dir, R::TABLE);
    if !path.exists() {
        debug!("{} not found, starting empty", path.display());
        return Ok(Table::default());
    }
    let text = fs::read_to_string(&path).map_err(|source| IngestError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| IngestError::Json { path, source })
}
