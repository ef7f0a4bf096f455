//! Parallaxes and proper motions, each with an adopted value per source.

use log::debug;

use crate::db::model::{Parallax, ProperMotion};
use crate::db::Database;
use crate::error::{ensure_non_negative, measurement, required, IngestError, Result};

#[derive(Debug, Clone, Default)]
pub struct NewParallax<'a> {
    pub source: Option<&'a str>,
    pub parallax: Option<f64>,
    pub parallax_error: Option<f64>,
    pub reference: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct NewProperMotion<'a> {
    pub source: Option<&'a str>,
    pub mu_ra: Option<f64>,
    pub mu_ra_error: Option<f64>,
    pub mu_dec: Option<f64>,
    pub mu_dec_error: Option<f64>,
    pub reference: Option<&'a str>,
}

/// Whether a new measurement with `new_error` takes over as adopted.
///
/// `adopted_error` is `None` when the source has no adopted measurement,
/// otherwise the uncertainty of the adopted one.
fn takes_adoption(adopted_error: Option<Option<f64>>, new_error: Option<f64>) -> bool {
    match (adopted_error, new_error) {
        (None, _) => true,
        (Some(None), Some(_)) => true,
        (Some(Some(old)), Some(new)) => new < old,
        (Some(_), None) => false,
    }
}

/// Add a parallax measurement.
///
/// The first parallax of a source is adopted; a later one with a strictly
/// smaller uncertainty replaces it as the adopted value.
pub fn ingest_parallax(db: &mut Database, new: &NewParallax<'_>) -> Result<()> {
    let source = required("source", new.source)?;
    let reference = required("reference", new.reference)?;
    let parallax = measurement("parallax", new.parallax)?;
    ensure_non_negative("Parallax error", new.parallax_error)?;

    db.require_source(source)?;
    db.require_reference(reference)?;
    if db
        .parallaxes
        .contains(|p| p.source == source && p.reference == reference)
    {
        return Err(IngestError::DuplicateEntry(format!(
            "Parallax for {source} from {reference} already in the database"
        )));
    }

    let adopted_error = db
        .parallaxes
        .find(|p| p.source == source && p.adopted)
        .map(|p| p.parallax_error);
    let adopted = takes_adoption(adopted_error, new.parallax_error);
    if adopted {
        for p in db.parallaxes.rows_mut().filter(|p| p.source == source) {
            p.adopted = false;
        }
    }

    db.parallaxes.insert(Parallax {
        source: source.to_string(),
        parallax,
        parallax_error: new.parallax_error,
        adopted,
        reference: reference.to_string(),
    });
    debug!("Parallax {parallax} for {source} added (adopted: {adopted})");
    Ok(())
}

/// Add a proper motion measurement. Adoption follows the RA uncertainty.
pub fn ingest_proper_motion(db: &mut Database, new: &NewProperMotion<'_>) -> Result<()> {
    let source = required("source", new.source)?;
    let reference = required("reference", new.reference)?;
    let mu_ra = measurement("mu_ra", new.mu_ra)?;
    let mu_dec = measurement("mu_dec", new.mu_dec)?;
    ensure_non_negative("Proper motion RA error", new.mu_ra_error)?;
    ensure_non_negative("Proper motion Dec error", new.mu_dec_error)?;

    db.require_source(source)?;
    db.require_reference(reference)?;
    if db
        .proper_motions
        .contains(|p| p.source == source && p.reference == reference)
    {
        return Err(IngestError::DuplicateEntry(format!(
            "Proper motion for {source} from {reference} already in the database"
        )));
    }

    let adopted_error = db
        .proper_motions
        .find(|p| p.source == source && p.adopted)
        .map(|p| p.mu_ra_error);
    let adopted = takes_adoption(adopted_error, new.mu_ra_error);
    if adopted {
        for p in db.proper_motions.rows_mut().filter(|p| p.source == source) {
            p.adopted = false;
        }
    }

    db.proper_motions.insert(ProperMotion {
        source: source.to_string(),
        mu_ra,
        mu_ra_error: new.mu_ra_error,
        mu_dec,
        mu_dec_error: new.mu_dec_error,
        adopted,
        reference: reference.to_string(),
    });
    debug!("Proper motion for {source} added (adopted: {adopted})");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::filter::Filter;
    use crate::db::model::TableName;

    fn plx<'a>(source: &'a str, value: f64, error: f64, reference: &'a str) -> NewParallax<'a> {
        NewParallax {
            source: Some(source),
            parallax: Some(value),
            parallax_error: Some(error),
            reference: Some(reference),
        }
    }

    #[test]
    fn test_adoption_moves_to_smaller_error() {
        let mut db = Database::default();
        ingest_parallax(&mut db, &plx("Fake 1", 113.0, 0.5, "Ref 1")).unwrap();
        ingest_parallax(&mut db, &plx("Fake 1", 113.2, 0.9, "Ref 2")).unwrap();
        ingest_parallax(&mut db, &plx("Fake 1", 113.1, 0.3, "Ref 3")).unwrap();
        ingest_parallax(&mut db, &plx("Fake 2", 145.0, 0.5, "Ref 1")).unwrap();

        let adopted = db.parallaxes.query(&[Filter::eq("adopted", true)]);
        let refs: Vec<(&str, &str)> = adopted
            .iter()
            .map(|p| (p.source.as_str(), p.reference.as_str()))
            .collect();
        assert_eq!(refs, vec![("Fake 1", "Ref 3"), ("Fake 2", "Ref 1")]);
        assert_eq!(db.count(TableName::Parallaxes, &[]), 4);
    }

    #[test]
    fn test_parallax_validation() {
        let mut db = Database::default();
        assert!(matches!(
            ingest_parallax(&mut db, &plx("Fake 1", 113.0, -0.3, "Ref 1")),
            Err(IngestError::InvalidValue { .. })
        ));
        let no_value = NewParallax {
            parallax: None,
            ..plx("Fake 1", 0.0, 0.3, "Ref 1")
        };
        assert!(matches!(
            ingest_parallax(&mut db, &no_value),
            Err(IngestError::MissingParameter { .. })
        ));
        for (value, error) in [(f64::NAN, 0.3), (f64::INFINITY, 0.3), (113.0, f64::NAN)] {
            assert!(matches!(
                ingest_parallax(&mut db, &plx("Fake 1", value, error, "Ref 1")),
                Err(IngestError::InvalidValue { .. })
            ));
        }
        assert!(db.parallaxes.is_empty());
        ingest_parallax(&mut db, &plx("Fake 1", 113.0, 0.3, "Ref 1")).unwrap();
        assert!(matches!(
            ingest_parallax(&mut db, &plx("Fake 1", 114.0, 0.1, "Ref 1")),
            Err(IngestError::DuplicateEntry(_))
        ));
        assert_eq!(db.parallaxes.len(), 1);
    }

    #[test]
    fn test_proper_motion_adoption() {
        let mut db = Database::default();
        let pm = |err: f64, reference: &'static str| NewProperMotion {
            source: Some("Fake 1"),
            mu_ra: Some(113.0),
            mu_ra_error: Some(err),
            mu_dec: Some(113.0),
            mu_dec_error: Some(0.3),
            reference: Some(reference),
        };
        ingest_proper_motion(&mut db, &pm(0.3, "Ref 1")).unwrap();
        ingest_proper_motion(&mut db, &pm(0.3, "Ref 2")).unwrap();

        let adopted: Vec<bool> = db.proper_motions.rows().iter().map(|p| p.adopted).collect();
        assert_eq!(adopted, vec![true, false]);

        let bad = NewProperMotion {
            mu_dec: Some(f64::NEG_INFINITY),
            ..pm(0.1, "Ref 3")
        };
        assert!(matches!(
            ingest_proper_motion(&mut db, &bad),
            Err(IngestError::InvalidValue { .. })
        ));
        assert_eq!(db.proper_motions.len(), 2);
    }

    #[test]
    fn test_takes_adoption() {
        assert!(takes_adoption(None, None));
        assert!(takes_adoption(Some(None), Some(1.0)));
        assert!(!takes_adoption(Some(Some(1.0)), None));
        assert!(!takes_adoption(Some(Some(1.0)), Some(1.0)));
        assert!(takes_adoption(Some(Some(1.0)), Some(0.5)));
    }
}
