//! Companion relationships between two catalog sources.

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::db::model::CompanionRelationshipRow;
use crate::db::Database;
use crate::error::{ensure_non_negative, required, IngestError, Result};

/// How `companion` relates to `source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
    Parent,
    Child,
    Sibling,
    UnresolvedParent,
    Companion,
}

impl RelationshipKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipKind::Parent => "Parent",
            RelationshipKind::Child => "Child",
            RelationshipKind::Sibling => "Sibling",
            RelationshipKind::UnresolvedParent => "Unresolved Parent",
            RelationshipKind::Companion => "Companion",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipKind {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parent" => Ok(RelationshipKind::Parent),
            "child" => Ok(RelationshipKind::Child),
            "sibling" => Ok(RelationshipKind::Sibling),
            "unresolved parent" => Ok(RelationshipKind::UnresolvedParent),
            "companion" => Ok(RelationshipKind::Companion),
            _ => Err(IngestError::UnknownRelationship(s.to_string())),
        }
    }
}

/// A relationship as supplied by a caller, before validation.
#[derive(Debug, Clone, Default)]
pub struct NewCompanionRelationship<'a> {
    pub source: Option<&'a str>,
    pub companion: Option<&'a str>,
    /// Relationship kind as written, parsed during validation.
    pub relationship: Option<&'a str>,
    pub projected_separation_arcsec: Option<f64>,
    pub projected_separation_error: Option<f64>,
    pub reference: Option<&'a str>,
    pub comments: Option<&'a str>,
}

impl NewCompanionRelationship<'_> {
    /// Check the relationship on its own, without looking at the database.
    ///
    /// Order matters: missing names, then self-reference, then the
    /// relationship kind, then the separation and its error.
    pub fn validate(&self) -> Result<CompanionRelationshipRow> {
        let source = required("source", self.source)?;
        let companion = required("companion", self.companion)?;
        let relationship = required("relationship", self.relationship)?;

        if source == companion {
            return Err(IngestError::InvalidRelationship {
                name: source.to_string(),
            });
        }
        let relationship: RelationshipKind = relationship.parse()?;

        ensure_non_negative("Projected separation", self.projected_separation_arcsec)?;
        ensure_non_negative("Projected separation error", self.projected_separation_error)?;

        Ok(CompanionRelationshipRow {
            source: source.to_string(),
            companion: companion.to_string(),
            relationship: relationship.to_string(),
            projected_separation_arcsec: self.projected_separation_arcsec,
            projected_separation_error: self.projected_separation_error,
            reference: self.reference.map(str::to_string),
            comments: self.comments.map(str::to_string),
        })
    }
}

/// Validate and record that `companion` is related to `source`.
///
/// Only the `source -> companion` row is written; callers wanting the
/// reverse direction ingest it separately.
pub fn ingest_companion_relationships(
    db: &mut Database,
    source: Option<&str>,
    companion: Option<&str>,
    relationship: RelationshipKind,
    projected_separation_arcsec: Option<f64>,
    projected_separation_error: Option<f64>,
) -> Result<()> {
    ingest_companion_relationship(
        db,
        &NewCompanionRelationship {
            source,
            companion,
            relationship: Some(relationship.as_str()),
            projected_separation_arcsec,
            projected_separation_error,
            ..Default::default()
        },
    )
}

/// Same as [`ingest_companion_relationships`], with reference and comments.
pub fn ingest_companion_relationship(
    db: &mut Database,
    new: &NewCompanionRelationship<'_>,
) -> Result<()> {
    let row = new.validate()?;

    db.require_source(&row.source)?;
    if let Some(reference) = &row.reference {
        db.require_reference(reference)?;
    }
    if db
        .companion_relationships
        .contains(|r| r.source == row.source && r.companion == row.companion)
    {
        return Err(IngestError::DuplicateEntry(format!(
            "Relationship between {} and {} already in the database",
            row.source, row.companion
        )));
    }

    debug!(
        "{} is a {} of {}",
        row.companion, row.relationship, row.source
    );
    db.companion_relationships.insert(row);
    Ok(())
}
