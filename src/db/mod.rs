/// Database layer: typed tables, column filters, and JSON persistence.
///
/// Architecture:
/// ```text
///   ingest::* / spectral_type / companions
///        │  validate, then insert one row
///        ▼
///   ┌──────────┐
///   │ Database  │  one Table<R> per relational table
///   └──────────┘
///        │                       ▲
///        ▼                       │
///   ┌──────────┐           ┌──────────┐
///   │  filter   │  queries  │  store    │  <dir>/<Table>.json
///   └──────────┘           └──────────┘
/// ```
pub mod filter;
pub mod model;
pub mod store;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};
use filter::{row_matches, Filter};
use model::{
    CompanionRelationshipRow, FieldValue, ModeledParameter, Name, Parallax, Photometry,
    ProperMotion, Publication, Record, Source, SpectralTypeRow, SpectrumRow, TableName,
};

// ---------------------------------------------------------------------------
// Table – an ordered collection of rows of one type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table<R> {
    rows: Vec<R>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Table { rows: Vec::new() }
    }
}

impl<R: Record> Table<R> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// First row satisfying `pred`.
    pub fn find(&self, pred: impl Fn(&R) -> bool) -> Option<&R> {
        self.rows.iter().find(|r| pred(*r))
    }

    pub fn contains(&self, pred: impl Fn(&R) -> bool) -> bool {
        self.rows.iter().any(pred)
    }

    /// Rows passing every filter, in insertion order.
    pub fn query(&self, filters: &[Filter]) -> Vec<&R> {
        self.rows
            .iter()
            .filter(|r| filters.is_empty() || row_matches(&r.to_columns(), filters))
            .collect()
    }

    pub fn count(&self, filters: &[Filter]) -> usize {
        if filters.is_empty() {
            return self.rows.len();
        }
        self.rows
            .iter()
            .filter(|r| row_matches(&r.to_columns(), filters))
            .count()
    }

    /// Sorted distinct values of `column` over the rows passing `filters`.
    pub fn distinct(&self, column: &str, filters: &[Filter]) -> BTreeSet<FieldValue> {
        self.query(filters)
            .into_iter()
            .map(|r| r.field(column))
            .collect()
    }

    pub(crate) fn insert(&mut self, row: R) {
        self.rows.push(row);
    }

    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut R> {
        self.rows.iter_mut()
    }
}

// ---------------------------------------------------------------------------
// Integrity options
// ---------------------------------------------------------------------------

/// Foreign-key style checks applied at ingest time. Both off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityOptions {
    /// Reject rows whose reference is not in `Publications`.
    #[serde(default)]
    pub check_references: bool,
    /// Reject rows whose source is not in `Sources`.
    #[serde(default)]
    pub check_sources: bool,
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// All tables of the catalog database.
///
/// Tables are readable by anyone; rows are only added through the ingest
/// operations, which validate before they mutate.
#[derive(Debug, Clone, Default)]
pub struct Database {
    pub options: IntegrityOptions,
    pub publications: Table<Publication>,
    pub sources: Table<Source>,
    pub names: Table<Name>,
    pub spectral_types: Table<SpectralTypeRow>,
    pub companion_relationships: Table<CompanionRelationshipRow>,
    pub photometry: Table<Photometry>,
    pub proper_motions: Table<ProperMotion>,
    pub parallaxes: Table<Parallax>,
    pub spectra: Table<SpectrumRow>,
    pub modeled_parameters: Table<ModeledParameter>,
}

/// Dispatch `$body` on the table named by `$name`, binding it to `$table`.
macro_rules! with_table {
    ($db:expr, $name:expr, |$table:ident| $body:expr) => {
        match $name {
            $crate::db::model::TableName::Publications => { let $table = &$db.publications; $body }
            $crate::db::model::TableName::Sources => { let $table = &$db.sources; $body }
            $crate::db::model::TableName::Names => { let $table = &$db.names; $body }
            $crate::db::model::TableName::SpectralTypes => { let $table = &$db.spectral_types; $body }
            $crate::db::model::TableName::CompanionRelationships => { let $table = &$db.companion_relationships; $body }
            $crate::db::model::TableName::Photometry => { let $table = &$db.photometry; $body }
            $crate::db::model::TableName::ProperMotions => { let $table = &$db.proper_motions; $body }
            $crate::db::model::TableName::Parallaxes => { let $table = &$db.parallaxes; $body }
            $crate::db::model::TableName::Spectra => { let $table = &$db.spectra; $body }
            $crate::db::model::TableName::ModeledParameters => { let $table = &$db.modeled_parameters; $body }
        }
    };
}
pub(crate) use with_table;

impl Database {
    pub fn new(options: IntegrityOptions) -> Self {
        Database {
            options,
            ..Default::default()
        }
    }

    /// Number of rows in the named table passing `filters`.
    pub fn count(&self, table: TableName, filters: &[Filter]) -> usize {
        with_table!(self, table, |t| t.count(filters))
    }

    /// Distinct values of a column in the named table.
    pub fn distinct(
        &self,
        table: TableName,
        column: &str,
        filters: &[Filter],
    ) -> BTreeSet<FieldValue> {
        with_table!(self, table, |t| t.distinct(column, filters))
    }

    pub fn publication(&self, reference: &str) -> Option<&Publication> {
        self.publications.find(|p| p.reference == reference)
    }

    pub fn source(&self, name: &str) -> Option<&Source> {
        self.sources.find(|s| s.source == name)
    }

    /// Fails with `ReferenceNotFound` when reference checks are enabled
    /// and the publication is unknown.
    pub fn require_reference(&self, reference: &str) -> Result<()> {
        if self.options.check_references && self.publication(reference).is_none() {
            return Err(IngestError::ReferenceNotFound {
                reference: reference.to_string(),
            });
        }
        Ok(())
    }

    /// Fails with `SourceNotFound` when source checks are enabled and the
    /// source is unknown.
    pub fn require_source(&self, name: &str) -> Result<()> {
        if self.options.check_sources && self.source(name).is_none() {
            return Err(IngestError::SourceNotFound {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
