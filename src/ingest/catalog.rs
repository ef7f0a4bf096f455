use std::fmt;

use clap::ValueEnum;
use log::{error, info, warn};

use super::{
    ingest_modeled_parameter, ingest_name, ingest_parallax, ingest_photometry,
    ingest_proper_motion, ingest_publication, ingest_source, ingest_spectrum, IngestReport,
    NewModeledParameter, NewParallax, NewPhotometry, NewProperMotion, NewSource, NewSpectrum,
    OnError, RowError,
};
use crate::companions::{ingest_companion_relationship, NewCompanionRelationship};
use crate::db::Database;
use crate::error::{IngestError, Result};
use crate::loader::{CatalogRow, CatalogTable};
use crate::spectral_type::ingest_spectral_type;

/// Which table a catalog file feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatalogKind {
    Publications,
    Sources,
    Names,
    SpectralTypes,
    Companions,
    Parallaxes,
    ProperMotions,
    Photometry,
    Spectra,
    ModeledParameters,
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(v) => f.write_str(v.get_name()),
            None => write!(f, "{self:?}"),
        }
    }
}

/// Ingest every row of `table` into the table selected by `kind`.
///
/// With [`OnError::Halt`] the first rejected row aborts the batch; rows
/// before it stay ingested. With [`OnError::Skip`] rejected rows are
/// logged and listed in the report.
pub fn ingest_catalog(
    db: &mut Database,
    kind: CatalogKind,
    table: &CatalogTable,
    on_error: OnError,
) -> Result<IngestReport> {
    let mut report = IngestReport::default();

    for (idx, row) in table.rows.iter().enumerate() {
        let line = idx + 1;
        report.rows_read += 1;

        match ingest_row(db, kind, row) {
            Ok(()) => report.rows_added += 1,
            Err(e) => {
                let source = row.text("source");
                if on_error == OnError::Halt {
                    error!("{kind} row {line} rejected: {e}");
                    return Err(e);
                }
                warn!("Skipping {kind} row {line}: {e}");
                report.row_errors.push(RowError {
                    line,
                    source,
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        "{kind}: {} of {} rows added, {} skipped",
        report.rows_added,
        report.rows_read,
        report.row_errors.len()
    );
    Ok(report)
}

fn text_or_missing(row: &CatalogRow, column: &str) -> Result<String> {
    row.text(column)
        .ok_or_else(|| IngestError::missing(column))
}

fn ingest_row(db: &mut Database, kind: CatalogKind, row: &CatalogRow) -> Result<()> {
    match kind {
        CatalogKind::Publications => ingest_publication(
            db,
            &text_or_missing(row, "reference")?,
            row.text("bibcode").as_deref(),
            row.text("doi").as_deref(),
            row.text("description").as_deref(),
        ),
        CatalogKind::Sources => ingest_source(
            db,
            &NewSource {
                source: row.text("source").as_deref(),
                ra: row.number("ra")?,
                dec: row.number("dec")?,
                reference: row.text("reference").as_deref(),
                comments: row.text("comments").as_deref(),
            },
        ),
        CatalogKind::Names => ingest_name(
            db,
            &text_or_missing(row, "source")?,
            &text_or_missing(row, "other_name")?,
        ),
        CatalogKind::SpectralTypes => ingest_spectral_type(
            db,
            &text_or_missing(row, "source")?,
            &text_or_missing(row, "spectral_type")?,
            &text_or_missing(row, "reference")?,
            &text_or_missing(row, "regime")?,
        ),
        CatalogKind::Companions => {
            let (source, companion) = (row.text("source"), row.text("companion"));
            let relationship = row.text("relationship");
            let (reference, comments) = (row.text("reference"), row.text("comments"));
            let mut new = NewCompanionRelationship {
                source: source.as_deref(),
                companion: companion.as_deref(),
                relationship: relationship.as_deref(),
                reference: reference.as_deref(),
                comments: comments.as_deref(),
                ..Default::default()
            };
            // Names and kind are checked before the separation cells are read.
            new.validate()?;
            new.projected_separation_arcsec = row.number("projected_separation_arcsec")?;
            new.projected_separation_error = row.number("projected_separation_error")?;
            ingest_companion_relationship(db, &new)
        }
        CatalogKind::Parallaxes => ingest_parallax(
            db,
            &NewParallax {
                source: row.text("source").as_deref(),
                parallax: row.number("parallax")?,
                parallax_error: row.number("parallax_error")?,
                reference: row.text("reference").as_deref(),
            },
        ),
        CatalogKind::ProperMotions => ingest_proper_motion(
            db,
            &NewProperMotion {
                source: row.text("source").as_deref(),
                mu_ra: row.number("mu_ra")?,
                mu_ra_error: row.number("mu_ra_error")?,
                mu_dec: row.number("mu_dec")?,
                mu_dec_error: row.number("mu_dec_error")?,
                reference: row.text("reference").as_deref(),
            },
        ),
        CatalogKind::Photometry => ingest_photometry(
            db,
            &NewPhotometry {
                source: row.text("source").as_deref(),
                band: row.text("band").as_deref(),
                magnitude: row.number("magnitude")?,
                magnitude_error: row.number("magnitude_error")?,
                telescope: row.text("telescope").as_deref(),
                reference: row.text("reference").as_deref(),
            },
        ),
        CatalogKind::Spectra => ingest_spectrum(
            db,
            &NewSpectrum {
                source: row.text("source").as_deref(),
                access_url: row.text("access_url").as_deref(),
                regime: row.text("regime").as_deref(),
                telescope: row.text("telescope").as_deref(),
                instrument: row.text("instrument").as_deref(),
                mode: row.text("mode").as_deref(),
                observation_date: row.text("observation_date").as_deref(),
                reference: row.text("reference").as_deref(),
                comments: row.text("comments").as_deref(),
            },
        ),
        CatalogKind::ModeledParameters => ingest_modeled_parameter(
            db,
            &NewModeledParameter {
                source: row.text("source").as_deref(),
                parameter: row.text("parameter").as_deref(),
                value: row.number("value")?,
                error: row.number("error")?,
                unit: row.text("unit").as_deref(),
                reference: row.text("reference").as_deref(),
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::model::FieldValue;

    fn spt_table(rows: &[(&str, &str, &str)]) -> CatalogTable {
        CatalogTable {
            column_names: ["source", "spectral_type", "reference", "regime"]
                .map(String::from)
                .to_vec(),
            rows: rows
                .iter()
                .map(|(source, spt, reference)| {
                    [
                        ("source", FieldValue::from(*source)),
                        ("spectral_type", FieldValue::from(*spt)),
                        ("reference", FieldValue::from(*reference)),
                        ("regime", FieldValue::from("nir")),
                    ]
                    .into_iter()
                    .collect()
                })
                .collect(),
        }
    }

    #[test]
    fn test_skip_collects_row_errors() {
        let mut db = Database::default();
        let table = spt_table(&[
            ("Fake 1", "M5.6", "Ref 1"),
            ("Fake 2", "K5", "Ref 1"),
            ("Fake 1", "M5.6", "Ref 1"),
            ("Fake 3", "Y2pec", "Ref 2"),
        ]);

        let report = ingest_catalog(&mut db, CatalogKind::SpectralTypes, &table, OnError::Skip).unwrap();
        assert_eq!(report.rows_read, 4);
        assert_eq!(report.rows_added, 2);
        let lines: Vec<usize> = report.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 3]);
        assert_eq!(report.row_errors[1].source.as_deref(), Some("Fake 1"));
        assert!(report.row_errors[1].message.contains("already in the database"));
        assert_eq!(db.spectral_types.len(), 2);
    }

    #[test]
    fn test_halt_stops_at_first_error() {
        let mut db = Database::default();
        let table = spt_table(&[
            ("Fake 1", "M5.6", "Ref 1"),
            ("Fake 2", "Q1", "Ref 1"),
            ("Fake 3", "Y2pec", "Ref 2"),
        ]);

        let err = ingest_catalog(&mut db, CatalogKind::SpectralTypes, &table, OnError::Halt).unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
        assert_eq!(db.spectral_types.len(), 1);
    }

    #[test]
    fn test_companion_rows() {
        let mut db = Database::default();
        let row: CatalogRow = [
            ("source", FieldValue::from("Fake 1")),
            ("companion", FieldValue::from("Fake 2")),
            ("relationship", FieldValue::from("sibling")),
            ("projected_separation_arcsec", FieldValue::Integer(4)),
            ("projected_separation_error", FieldValue::Null),
        ]
        .into_iter()
        .collect();
        let bad_kind = CatalogRow(
            row.0
                .clone()
                .into_iter()
                .map(|(k, v)| match k.as_str() {
                    "relationship" => (k, FieldValue::from("Cousin")),
                    _ => (k, v),
                })
                .collect(),
        );
        let table = CatalogTable {
            column_names: row.0.keys().cloned().collect(),
            rows: vec![row, bad_kind],
        };

        let report = ingest_catalog(&mut db, CatalogKind::Companions, &table, OnError::Skip).unwrap();
        assert_eq!(report.rows_added, 1);
        assert!(report.row_errors[0].message.contains("Unknown relationship"));
        let rel = &db.companion_relationships.rows()[0];
        assert_eq!(rel.relationship, "Sibling");
        assert_eq!(rel.projected_separation_arcsec, Some(4.0));
    }

    fn companion_row(companion: &str, relationship: &str, separation: &str) -> CatalogRow {
        [
            ("source", "Fake 1"),
            ("companion", companion),
            ("relationship", relationship),
            ("projected_separation_arcsec", separation),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_companion_checks_run_in_order() {
        let mut db = Database::default();
        let cases = [
            (companion_row("", "Cousin", "-5 arcsec"), "Make sure all required parameters"),
            (companion_row("Fake 1", "Cousin", "-5 arcsec"), "Source cannot be the same as companion"),
            (companion_row("Fake 2", "Cousin", "-5 arcsec"), "Unknown relationship"),
            (companion_row("Fake 2", "Sibling", "-5 arcsec"), "is not a number"),
            (companion_row("Fake 2", "Sibling", "-5"), "cannot be negative"),
        ];
        for (row, message) in cases {
            let err = ingest_row(&mut db, CatalogKind::Companions, &row).unwrap_err();
            assert!(err.to_string().contains(message), "{err}");
        }
        assert!(db.companion_relationships.is_empty());
    }

    #[test]
    fn test_text_in_numeric_column_is_rejected() {
        let mut db = Database::default();
        let row: CatalogRow = [
            ("source", FieldValue::from("Fake 1")),
            ("parallax", FieldValue::from("113 mas")),
            ("reference", FieldValue::from("Ref 1")),
        ]
        .into_iter()
        .collect();
        let err = ingest_row(&mut db, CatalogKind::Parallaxes, &row).unwrap_err();
        assert!(matches!(err, IngestError::InvalidValue { .. }));
        assert_eq!(err.to_string(), "parallax is not a number: 113 mas");

        let numeric_text: CatalogRow = [
            ("source", FieldValue::from("Fake 1")),
            ("parallax", FieldValue::from(" 113.5 ")),
            ("reference", FieldValue::from("Ref 1")),
        ]
        .into_iter()
        .collect();
        ingest_row(&mut db, CatalogKind::Parallaxes, &numeric_text).unwrap();
        assert_eq!(db.parallaxes.rows()[0].parallax, 113.5);
    }

    #[test]
    fn test_kind_display_matches_cli_name() {
        assert_eq!(CatalogKind::SpectralTypes.to_string(), "spectral-types");
        assert_eq!(CatalogKind::ProperMotions.to_string(), "proper-motions");
    }
}
