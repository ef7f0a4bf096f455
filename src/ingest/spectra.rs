use log::debug;

use crate::db::model::{ModeledParameter, SpectrumRow};
use crate::db::Database;
use crate::error::{ensure_non_negative, measurement, required, IngestError, Result};

/// A spectrum file reference to add to the `Spectra` table.
#[derive(Debug, Clone, Default)]
pub struct NewSpectrum<'a> {
    pub source: Option<&'a str>,
    /// Where the spectrum file can be fetched from.
    pub access_url: Option<&'a str>,
    /// Wavelength regime: `optical`, `nir`, `mir`, ...
    pub regime: Option<&'a str>,
    pub telescope: Option<&'a str>,
    pub instrument: Option<&'a str>,
    pub mode: Option<&'a str>,
    pub observation_date: Option<&'a str>,
    pub reference: Option<&'a str>,
    pub comments: Option<&'a str>,
}

pub fn ingest_spectrum(db: &mut Database, new: &NewSpectrum<'_>) -> Result<()> {
    let source = required("source", new.source)?;
    let access_url = required("access_url", new.access_url)?;
    let regime = required("regime", new.regime)?;
    let reference = required("reference", new.reference)?;

    db.require_source(source)?;
    db.require_reference(reference)?;
    if db
        .spectra
        .contains(|s| s.source == source && s.access_url == access_url)
    {
        return Err(IngestError::DuplicateEntry(format!(
            "Spectrum {access_url} for {source} already in the database"
        )));
    }

    db.spectra.insert(SpectrumRow {
        source: source.to_string(),
        access_url: access_url.to_string(),
        regime: regime.to_string(),
        telescope: new.telescope.map(str::to_string),
        instrument: new.instrument.map(str::to_string),
        mode: new.mode.map(str::to_string),
        observation_date: new.observation_date.map(str::to_string),
        reference: reference.to_string(),
        comments: new.comments.map(str::to_string),
    });
    debug!("Spectrum for {source} added from {access_url}");
    Ok(())
}

/// A model-derived physical parameter (T eff, log g, mass, ...).
#[derive(Debug, Clone, Default)]
pub struct NewModeledParameter<'a> {
    pub source: Option<&'a str>,
    pub parameter: Option<&'a str>,
    pub value: Option<f64>,
    pub error: Option<f64>,
    pub unit: Option<&'a str>,
    pub reference: Option<&'a str>,
}

pub fn ingest_modeled_parameter(db: &mut Database, new: &NewModeledParameter<'_>) -> Result<()> {
    let source = required("source", new.source)?;
    let parameter = required("parameter", new.parameter)?;
    let reference = required("reference", new.reference)?;
    let value = measurement("value", new.value)?;
    ensure_non_negative("Parameter error", new.error)?;

    db.require_source(source)?;
    db.require_reference(reference)?;
    if db.modeled_parameters.contains(|m| {
        m.source == source && m.parameter == parameter && m.reference == reference
    }) {
        return Err(IngestError::DuplicateEntry(format!(
            "{parameter} for {source} from {reference} already in the database"
        )));
    }

    db.modeled_parameters.insert(ModeledParameter {
        source: source.to_string(),
        parameter: parameter.to_string(),
        value,
        error: new.error,
        unit: new.unit.map(str::to_string),
        reference: reference.to_string(),
    });
    Ok(())
}
