use log::debug;

use crate::db::model::{Name, Source};
use crate::db::Database;
use crate::error::{ensure_finite, required, IngestError, Result};

/// A source to add to the `Sources` table.
#[derive(Debug, Clone, Default)]
pub struct NewSource<'a> {
    pub source: Option<&'a str>,
    pub ra: Option<f64>,
    pub dec: Option<f64>,
    pub reference: Option<&'a str>,
    pub comments: Option<&'a str>,
}

/// Add a source. Its own name is also recorded in `Names`.
pub fn ingest_source(db: &mut Database, new: &NewSource<'_>) -> Result<()> {
    let name = required("source", new.source)?;
    ensure_finite("ra", new.ra)?;
    ensure_finite("dec", new.dec)?;
    if let Some(reference) = new.reference {
        db.require_reference(reference)?;
    }
    if db.source(name).is_some() {
        return Err(IngestError::DuplicateEntry(format!(
            "Source {name} already in the database"
        )));
    }

    db.sources.insert(Source {
        source: name.to_string(),
        ra: new.ra,
        dec: new.dec,
        reference: new.reference.map(str::to_string),
        comments: new.comments.map(str::to_string),
    });
    if !has_name(db, name, name) {
        db.names.insert(Name {
            source: name.to_string(),
            other_name: name.to_string(),
        });
    }
    debug!("Source {name} added");
    Ok(())
}

/// Record an alternate designation for a source.
pub fn ingest_name(db: &mut Database, source: &str, other_name: &str) -> Result<()> {
    let source = required("source", Some(source))?;
    let other_name = required("other_name", Some(other_name))?;
    db.require_source(source)?;
    if has_name(db, source, other_name) {
        return Err(IngestError::DuplicateEntry(format!(
            "Name {other_name} for {source} already in the database"
        )));
    }
    db.names.insert(Name {
        source: source.to_string(),
        other_name: other_name.to_string(),
    });
    Ok(())
}

fn has_name(db: &Database, source: &str, other_name: &str) -> bool {
    db.names
        .contains(|n| n.source == source && n.other_name == other_name)
}
