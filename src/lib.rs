//! Ingestion and verification for a database of low-mass stars and brown
//! dwarfs: sources, names, publications, spectral types, companions,
//! astrometry, photometry, spectra and modeled parameters.

pub mod companions;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod loader;
pub mod spectral_type;
pub mod verify;

pub use companions::{ingest_companion_relationships, RelationshipKind};
pub use db::Database;
pub use error::{IngestError, Result};
pub use spectral_type::{
    convert_spt_code_to_string, convert_spt_string_to_code, ingest_spectral_type,
};
