use std::path::PathBuf;

use thiserror::Error;

/// Every way an ingest, conversion or lookup can fail.
///
/// Messages are matched on by downstream scripts, keep the wording stable.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Could not parse spectral type '{input}': {reason}")]
    Parse { input: String, reason: String },

    #[error("Spectral type code {code} is outside the range [60, 100)")]
    Range { code: f64 },

    #[error("{0}")]
    DuplicateEntry(String),

    #[error("The publication does not exist in the database: {reference}")]
    ReferenceNotFound { reference: String },

    #[error("Source {name} does not exist in the database")]
    SourceNotFound { name: String },

    #[error("Make sure all required parameters are provided. Missing: {parameter}")]
    MissingParameter { parameter: String },

    #[error("Source cannot be the same as companion name: {name}")]
    InvalidRelationship { name: String },

    #[error("{field} {reason}: {value}")]
    InvalidValue {
        field: String,
        value: String,
        reason: &'static str,
    },

    #[error("Unknown relationship '{0}', expected one of Parent, Child, Sibling, Unresolved Parent, Companion")]
    UnknownRelationship(String),

    #[error("Unknown table '{0}'")]
    UnknownTable(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    pub(crate) fn missing(parameter: &str) -> Self {
        IngestError::MissingParameter {
            parameter: parameter.to_string(),
        }
    }

    pub(crate) fn invalid(field: &str, value: impl ToString, reason: &'static str) -> Self {
        IngestError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason,
        }
    }
}

/// Reject NaN and infinities; they cannot be stored as JSON numbers.
pub(crate) fn ensure_finite(field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() => Err(IngestError::invalid(field, v, "must be a finite number")),
        _ => Ok(()),
    }
}

/// Reject a negative or non-finite optional measurement.
pub(crate) fn ensure_non_negative(field: &str, value: Option<f64>) -> Result<()> {
    ensure_finite(field, value)?;
    match value {
        Some(v) if v < 0.0 => Err(IngestError::invalid(field, v, "cannot be negative")),
        _ => Ok(()),
    }
}

/// A required finite measurement.
pub(crate) fn measurement(field: &str, value: Option<f64>) -> Result<f64> {
    let v = value.ok_or_else(|| IngestError::missing(field))?;
    ensure_finite(field, Some(v))?;
    Ok(v)
}

/// Treat `None` and blank strings alike as a missing required parameter.
pub(crate) fn required<'a>(parameter: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(IngestError::missing(parameter)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_negative_rejects_nan_and_infinity() {
        assert!(ensure_non_negative("Separation", None).is_ok());
        assert!(ensure_non_negative("Separation", Some(0.0)).is_ok());
        for bad in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                ensure_non_negative("Separation", Some(bad)),
                Err(IngestError::InvalidValue { .. })
            ));
        }
        let err = ensure_non_negative("Separation", Some(-2.5)).unwrap_err();
        assert_eq!(err.to_string(), "Separation cannot be negative: -2.5");
    }

    #[test]
    fn test_measurement_must_be_present_and_finite() {
        assert_eq!(measurement("parallax", Some(-3.0)).unwrap(), -3.0);
        assert!(matches!(
            measurement("parallax", None),
            Err(IngestError::MissingParameter { .. })
        ));
        let err = measurement("parallax", Some(f64::NAN)).unwrap_err();
        assert!(err.to_string().contains("must be a finite number"));
    }
}
