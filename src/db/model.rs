use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::IngestError;

// ---------------------------------------------------------------------------
// FieldValue – a single cell of a table or catalog column
// ---------------------------------------------------------------------------

/// A dynamically-typed column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Null,
}

// `distinct` collects column values into a `BTreeSet`, so values need a
// total order: nulls first, then by variant, then by value.

impl FieldValue {
    fn rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Integer(_) => 2,
            FieldValue::Float(_) => 3,
            FieldValue::String(_) => 4,
        }
    }
}

impl Eq for FieldValue {}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.total_cmp(b),
            (FieldValue::String(a), FieldValue::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl std::hash::Hash for FieldValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FieldValue::String(s) => s.hash(state),
            FieldValue::Integer(i) => i.hash(state),
            FieldValue::Float(f) => f.to_bits().hash(state),
            FieldValue::Bool(b) => b.hash(state),
            FieldValue::Null => {}
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl FieldValue {
    /// Interpret the value as an `f64` for numeric comparisons.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Render non-null scalars as text. Blank strings count as missing.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::String(s) if s.trim().is_empty() => None,
            FieldValue::String(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Equality that treats `Integer(92)` and `Float(92.0)` as the same value.
    pub fn loose_eq(&self, other: &FieldValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    pub fn from_json(val: &JsonValue) -> FieldValue {
        match val {
            JsonValue::String(s) => FieldValue::String(s.clone()),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    FieldValue::Float(f)
                } else {
                    FieldValue::String(n.to_string())
                }
            }
            JsonValue::Bool(b) => FieldValue::Bool(*b),
            JsonValue::Null => FieldValue::Null,
            other => FieldValue::String(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Table names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TableName {
    Publications,
    Sources,
    Names,
    SpectralTypes,
    CompanionRelationships,
    Photometry,
    ProperMotions,
    Parallaxes,
    Spectra,
    ModeledParameters,
}

impl TableName {
    pub const ALL: [TableName; 10] = [
        TableName::Publications,
        TableName::Sources,
        TableName::Names,
        TableName::SpectralTypes,
        TableName::CompanionRelationships,
        TableName::Photometry,
        TableName::ProperMotions,
        TableName::Parallaxes,
        TableName::Spectra,
        TableName::ModeledParameters,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TableName::Publications => "Publications",
            TableName::Sources => "Sources",
            TableName::Names => "Names",
            TableName::SpectralTypes => "SpectralTypes",
            TableName::CompanionRelationships => "CompanionRelationships",
            TableName::Photometry => "Photometry",
            TableName::ProperMotions => "ProperMotions",
            TableName::Parallaxes => "Parallaxes",
            TableName::Spectra => "Spectra",
            TableName::ModeledParameters => "ModeledParameters",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableName {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableName::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| IngestError::UnknownTable(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Record – a row type stored in a table
// ---------------------------------------------------------------------------

/// A row of one of the database tables.
///
/// Column lookup goes through the serde representation, so a column name
/// is exactly the serialized field name.
pub trait Record: Clone + Serialize + DeserializeOwned {
    const TABLE: TableName;

    fn to_columns(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }

    fn field(&self, column: &str) -> FieldValue {
        self.to_columns()
            .get(column)
            .map(FieldValue::from_json)
            .unwrap_or(FieldValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub reference: String,
    pub bibcode: Option<String>,
    pub doi: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub source: String,
    pub ra: Option<f64>,
    pub dec: Option<f64>,
    pub reference: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Name {
    pub source: String,
    pub other_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralTypeRow {
    pub source: String,
    pub spectral_type_string: String,
    pub spectral_type_code: f64,
    pub regime: String,
    pub adopted: bool,
    pub reference: String,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionRelationshipRow {
    pub source: String,
    pub companion: String,
    pub relationship: String,
    pub projected_separation_arcsec: Option<f64>,
    pub projected_separation_error: Option<f64>,
    pub reference: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photometry {
    pub source: String,
    pub band: String,
    pub magnitude: f64,
    pub magnitude_error: Option<f64>,
    pub telescope: Option<String>,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProperMotion {
    pub source: String,
    pub mu_ra: f64,
    pub mu_ra_error: Option<f64>,
    pub mu_dec: f64,
    pub mu_dec_error: Option<f64>,
    pub adopted: bool,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parallax {
    pub source: String,
    pub parallax: f64,
    pub parallax_error: Option<f64>,
    pub adopted: bool,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumRow {
    pub source: String,
    pub access_url: String,
    pub regime: String,
    pub telescope: Option<String>,
    pub instrument: Option<String>,
    pub mode: Option<String>,
    pub observation_date: Option<String>,
    pub reference: String,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeledParameter {
    pub source: String,
    pub parameter: String,
    pub value: f64,
    pub error: Option<f64>,
    pub unit: Option<String>,
    pub reference: String,
}

macro_rules! impl_record {
    ($($row:ty => $table:ident),* $(,)?) => {
        $(impl Record for $row {
            const TABLE: TableName = TableName::$table;
        })*
    };
}

impl_record! {
    Publication => Publications,
    Source => Sources,
    Name => Names,
    SpectralTypeRow => SpectralTypes,
    CompanionRelationshipRow => CompanionRelationships,
    Photometry => Photometry,
    ProperMotion => ProperMotions,
    Parallax => Parallaxes,
    SpectrumRow => Spectra,
    ModeledParameter => ModeledParameters,
}
