use log::debug;

use crate::db::model::Publication;
use crate::db::Database;
use crate::error::{required, IngestError, Result};

/// Add a publication under its short reference name (e.g. `Kirk19`).
pub fn ingest_publication(
    db: &mut Database,
    reference: &str,
    bibcode: Option<&str>,
    doi: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    let reference = required("reference", Some(reference))?;

    if db.publication(reference).is_some() {
        return Err(IngestError::DuplicateEntry(format!(
            "Publication {reference} already in the database"
        )));
    }

    db.publications.insert(Publication {
        reference: reference.to_string(),
        bibcode: bibcode.map(str::to_string),
        doi: doi.map(str::to_string),
        description: description.map(str::to_string),
    });
    debug!("Publication {reference} added");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_publication() {
        let mut db = Database::default();
        ingest_publication(
            &mut db,
            "Kirk19",
            Some("2019ApJS..240...19K"),
            Some("10.3847/1538-4365/aaf6af"),
            None,
        )
        .unwrap();
        let err = ingest_publication(&mut db, "Kirk19", None, None, None).unwrap_err();
        assert!(err.to_string().contains("Kirk19 already in the database"));
        assert_eq!(db.publications.len(), 1);
        assert_eq!(
            db.publication("Kirk19").and_then(|p| p.bibcode.as_deref()),
            Some("2019ApJS..240...19K")
        );
    }

    #[test]
    fn test_blank_reference_is_missing() {
        let mut db = Database::default();
        assert!(matches!(
            ingest_publication(&mut db, " ", None, None, None),
            Err(IngestError::MissingParameter { .. })
        ));
    }
}
