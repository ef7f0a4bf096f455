use log::debug;

use crate::db::model::Photometry;
use crate::db::Database;
use crate::error::{ensure_non_negative, measurement, required, IngestError, Result};

#[derive(Debug, Clone, Default)]
pub struct NewPhotometry<'a> {
    pub source: Option<&'a str>,
    /// Instrument-qualified band name, e.g. `2MASS.J` or `WISE.W1`.
    pub band: Option<&'a str>,
    pub magnitude: Option<f64>,
    pub magnitude_error: Option<f64>,
    pub telescope: Option<&'a str>,
    pub reference: Option<&'a str>,
}

pub fn ingest_photometry(db: &mut Database, new: &NewPhotometry<'_>) -> Result<()> {
    let source = required("source", new.source)?;
    let band = required("band", new.band)?;
    let reference = required("reference", new.reference)?;
    let magnitude = measurement("magnitude", new.magnitude)?;
    ensure_non_negative("Magnitude error", new.magnitude_error)?;

    db.require_source(source)?;
    db.require_reference(reference)?;
    if db
        .photometry
        .contains(|p| p.source == source && p.band == band && p.reference == reference)
    {
        return Err(IngestError::DuplicateEntry(format!(
            "Photometry for {source} in {band} from {reference} already in the database"
        )));
    }

    db.photometry.insert(Photometry {
        source: source.to_string(),
        band: band.to_string(),
        magnitude,
        magnitude_error: new.magnitude_error,
        telescope: new.telescope.map(str::to_string),
        reference: reference.to_string(),
    });
    debug!("{band} = {magnitude} for {source} added");
    Ok(())
}
