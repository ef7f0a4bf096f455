/// Ingest operations: one per table, plus batch ingestion of catalogs.
///
/// Every operation validates its input completely before touching the
/// database, so a returned error always leaves the tables unchanged.
pub mod astrometry;
pub mod catalog;
pub mod photometry;
pub mod publications;
pub mod sources;
pub mod spectra;

use serde::{Deserialize, Serialize};

pub use astrometry::{ingest_parallax, ingest_proper_motion, NewParallax, NewProperMotion};
pub use catalog::{ingest_catalog, CatalogKind};
pub use photometry::{ingest_photometry, NewPhotometry};
pub use publications::ingest_publication;
pub use sources::{ingest_name, ingest_source, NewSource};
pub use spectra::{ingest_modeled_parameter, ingest_spectrum, NewModeledParameter, NewSpectrum};

/// What batch ingestion does when a row is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Stop at the first rejected row and return its error.
    #[default]
    Halt,
    /// Log the rejected row and continue.
    Skip,
}

/// A row rejected during batch ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based position of the row in the catalog.
    pub line: usize,
    pub source: Option<String>,
    pub message: String,
}

/// Outcome of a batch ingestion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub rows_read: usize,
    pub rows_added: usize,
    pub row_errors: Vec<RowError>,
}
