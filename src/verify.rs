//! Row-count assertions over a loaded database.
//!
//! A suite is a JSON file listing expected counts, e.g.
//!
//! ```json
//! { "checks": [
//!     { "kind": "count", "name": "Y dwarfs", "table": "SpectralTypes",
//!       "filters": [{ "column": "spectral_type_code", "op": "ge", "value": 90 }],
//!       "expected": 59 },
//!     { "kind": "except", "name": "2MASS names without 2MASS photometry",
//!       "left":  { "table": "Names", "column": "source",
//!                  "filters": [{ "column": "other_name", "op": "like", "pattern": "2MASS J%" }] },
//!       "right": { "table": "Photometry", "column": "source",
//!                  "filters": [{ "column": "band", "op": "like", "pattern": "2MASS%" }] },
//!       "expected": 256 },
//!     { "kind": "publication", "reference": "Kirk19",
//!       "bibcode": "2019ApJS..240...19K", "doi": "10.3847/1538-4365/aaf6af" }
//! ] }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;

use crate::db::filter::Filter;
use crate::db::model::TableName;
use crate::db::Database;

#[derive(Debug, Clone, Deserialize)]
pub struct CheckSuite {
    pub checks: Vec<Check>,
}

/// Distinct values of one column over a filtered table.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnSelect {
    pub table: TableName,
    pub column: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    /// Number of rows matching `filters`.
    Count {
        #[serde(default)]
        name: Option<String>,
        table: TableName,
        #[serde(default)]
        filters: Vec<Filter>,
        expected: usize,
    },
    /// Number of values selected by `left` that `right` does not select.
    Except {
        name: String,
        left: ColumnSelect,
        right: ColumnSelect,
        expected: usize,
    },
    /// The publication exists with the given bibcode and DOI.
    Publication {
        reference: String,
        #[serde(default)]
        bibcode: Option<String>,
        #[serde(default)]
        doi: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    pub message: String,
}

impl CheckSuite {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading check suite {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing check suite {}", path.display()))
    }
}

fn describe_filters(filters: &[Filter]) -> String {
    if filters.is_empty() {
        return "all rows".to_string();
    }
    filters
        .iter()
        .map(|f| serde_json::to_string(f).unwrap_or_else(|_| f.column.clone()))
        .collect::<Vec<_>>()
        .join(" and ")
}

impl Check {
    pub fn run(&self, db: &Database) -> CheckOutcome {
        match self {
            Check::Count {
                name,
                table,
                filters,
                expected,
            } => {
                let found = db.count(*table, filters);
                CheckOutcome {
                    name: name
                        .clone()
                        .unwrap_or_else(|| format!("{table} {}", describe_filters(filters))),
                    passed: found == *expected,
                    message: format!("found {found} {table} entries, expected {expected}"),
                }
            }
            Check::Except {
                name,
                left,
                right,
                expected,
            } => {
                let l = db.distinct(left.table, &left.column, &left.filters);
                let r = db.distinct(right.table, &right.column, &right.filters);
                let found = l.difference(&r).count();
                CheckOutcome {
                    name: name.clone(),
                    passed: found == *expected,
                    message: format!("found {found} {}, expected {expected}", left.column),
                }
            }
            Check::Publication {
                reference,
                bibcode,
                doi,
            } => {
                let name = format!("publication {reference}");
                let Some(publication) = db.publication(reference) else {
                    return CheckOutcome {
                        name,
                        passed: false,
                        message: format!("Missing references: {reference}"),
                    };
                };
                let mut problems = Vec::new();
                if bibcode.is_some() && publication.bibcode != *bibcode {
                    problems.push(format!("{reference} did not match bibcode"));
                }
                if doi.is_some() && publication.doi != *doi {
                    problems.push(format!("{reference} did not match doi"));
                }
                CheckOutcome {
                    name,
                    passed: problems.is_empty(),
                    message: if problems.is_empty() {
                        "bibcode and doi match".to_string()
                    } else {
                        problems.join("; ")
                    },
                }
            }
        }
    }
}

/// Run every check in the suite, logging each outcome.
pub fn run_checks(db: &Database, suite: &CheckSuite) -> Vec<CheckOutcome> {
    let outcomes: Vec<CheckOutcome> = suite.checks.iter().map(|c| c.run(db)).collect();
    for o in &outcomes {
        if o.passed {
            info!("PASS {}: {}", o.name, o.message);
        } else {
            warn!("FAIL {}: {}", o.name, o.message);
        }
    }
    outcomes
}
