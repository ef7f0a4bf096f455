//! Spectral type codec: "M5.6" <-> 65.6.
//!
//! Numeric codes place the late-type classes on one axis so range queries
//! work: M = 60s, L = 70s, T = 80s, Y = 90s, with the subtype added on.

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::db::model::SpectralTypeRow;
use crate::db::Database;
use crate::error::{required, IngestError, Result};

/// Decimal places used when rendering a code back to a string.
pub const DEFAULT_DECIMALS: usize = 1;

/// Late-type spectral class, ordered M < L < T < Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpectralClass {
    M,
    L,
    T,
    Y,
}

impl SpectralClass {
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'M' => Some(SpectralClass::M),
            'L' => Some(SpectralClass::L),
            'T' => Some(SpectralClass::T),
            'Y' => Some(SpectralClass::Y),
            _ => None,
        }
    }

    /// Class whose decade contains `code`, if any.
    pub fn from_code(code: f64) -> Option<Self> {
        if !(60.0..100.0).contains(&code) {
            return None;
        }
        match (code / 10.0).floor() as i64 {
            6 => Some(SpectralClass::M),
            7 => Some(SpectralClass::L),
            8 => Some(SpectralClass::T),
            9 => Some(SpectralClass::Y),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            SpectralClass::M => 'M',
            SpectralClass::L => 'L',
            SpectralClass::T => 'T',
            SpectralClass::Y => 'Y',
        }
    }

    pub fn base_code(self) -> f64 {
        match self {
            SpectralClass::M => 60.0,
            SpectralClass::L => 70.0,
            SpectralClass::T => 80.0,
            SpectralClass::Y => 90.0,
        }
    }
}

impl fmt::Display for SpectralClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A parsed spectral type such as `sdL4.5 pec`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralType {
    /// Lower-case luminosity prefix, e.g. `sd`.
    pub prefix: Option<String>,
    pub class: SpectralClass,
    /// Subtype within the class, 0.0 up to (not including) 10.
    pub subtype: f64,
    /// Digits written after the decimal point.
    pub decimals: usize,
    /// Free text after the subtype, e.g. `pec` or `beta`.
    pub suffix: Option<String>,
}

impl SpectralType {
    /// Numeric code: class base plus subtype, at the written precision.
    pub fn code(&self) -> f64 {
        round_to(self.class.base_code() + self.subtype, self.decimals)
    }
}

impl FromStr for SpectralType {
    type Err = IngestError;

    fn from_str(input: &str) -> Result<Self> {
        let fail = |reason: &str| IngestError::Parse {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let text = input.trim();
        if text.is_empty() {
            return Err(fail("empty string"));
        }

        let prefix_len = text
            .bytes()
            .take_while(|b| b.is_ascii_lowercase())
            .count();
        let (prefix, rest) = text.split_at(prefix_len);

        let letter = rest
            .chars()
            .next()
            .ok_or_else(|| fail("missing spectral class letter"))?;
        let class = SpectralClass::from_letter(letter)
            .ok_or_else(|| fail(&format!("unrecognized spectral class '{letter}'")))?;

        let body = &rest[letter.len_utf8()..];
        let bytes = body.as_bytes();
        if !bytes.first().is_some_and(u8::is_ascii_digit) {
            return Err(fail("no numeric subtype"));
        }
        if bytes.get(1).is_some_and(u8::is_ascii_digit) {
            return Err(fail("subtype must be below 10"));
        }

        let mut end = 1;
        let mut decimals = 0;
        if bytes.get(1) == Some(&b'.') {
            decimals = bytes[2..].iter().take_while(|b| b.is_ascii_digit()).count();
            if decimals == 0 {
                return Err(fail("decimal point without digits"));
            }
            end = 2 + decimals;
        }

        let subtype: f64 = body[..end]
            .parse()
            .map_err(|_| fail("invalid numeric subtype"))?;
        let suffix = body[end..].trim();

        Ok(SpectralType {
            prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
            class,
            subtype,
            decimals,
            suffix: (!suffix.is_empty()).then(|| suffix.to_string()),
        })
    }
}

/// Subtype precision beyond this is clamped.
pub const MAX_DECIMALS: usize = 10;

fn round_to(value: f64, decimals: usize) -> f64 {
    let scale = 10f64.powi(decimals.min(MAX_DECIMALS) as i32);
    (value * scale).round() / scale
}

/// Convert a spectral type string to its numeric code.
///
/// `"M5.6"` -> 65.6, `"T0.1"` -> 80.1, `"Y2pec"` -> 92.0. Prefixes and
/// peculiarity suffixes do not affect the code.
pub fn convert_spt_string_to_code(spectral_type_string: &str) -> Result<f64> {
    Ok(spectral_type_string.parse::<SpectralType>()?.code())
}

/// Convert a numeric code in [60, 100) back to `"{Letter}{subtype}"`.
///
/// The subtype is rounded to `decimals` places (at most [`MAX_DECIMALS`]);
/// `decimals == 0` truncates to the integer subtype instead. A rounding
/// carry moves into the next class (69.96 -> "L0.0").
pub fn convert_spt_code_to_string(code: f64, decimals: usize) -> Result<String> {
    if SpectralClass::from_code(code).is_none() {
        return Err(IngestError::Range { code });
    }
    let decimals = decimals.min(MAX_DECIMALS);
    let value = if decimals == 0 {
        code.trunc()
    } else {
        round_to(code, decimals)
    };
    let class = SpectralClass::from_code(value).ok_or(IngestError::Range { code })?;
    let subtype = round_to(value - class.base_code(), decimals);
    Ok(format!("{}{:.*}", class.letter(), decimals, subtype))
}

/// Record a spectral type for `source` as measured in `reference`/`regime`.
///
/// The string is stored as given next to its numeric code. The first
/// spectral type recorded for a source is marked adopted.
pub fn ingest_spectral_type(
    db: &mut Database,
    source: &str,
    spectral_type_string: &str,
    reference: &str,
    regime: &str,
) -> Result<()> {
    let source = required("source", Some(source))?;
    let reference = required("reference", Some(reference))?;
    let regime = required("regime", Some(regime))?;
    let code = convert_spt_string_to_code(spectral_type_string)?;

    db.require_source(source)?;
    db.require_reference(reference)?;

    if db.spectral_types.contains(|r| {
        r.source == source && r.reference == reference && r.regime == regime
    }) {
        return Err(IngestError::DuplicateEntry(format!(
            "Spectral type for {source} already in the database: {reference}, {regime}"
        )));
    }

    let adopted = !db.spectral_types.contains(|r| r.source == source);
    db.spectral_types.insert(SpectralTypeRow {
        source: source.to_string(),
        spectral_type_string: spectral_type_string.to_string(),
        spectral_type_code: code,
        regime: regime.to_string(),
        adopted,
        reference: reference.to_string(),
        comments: None,
    });
    debug!("Spectral type {spectral_type_string} ({code}) added for {source}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case("M5.6", 65.6)]
    #[case("T0.1", 80.1)]
    #[case("Y2pec", 92.0)]
    #[case("L4.5 beta", 74.5)]
    #[case("sdM9", 69.0)]
    #[case("  T7.25 ", 87.25)]
    fn test_convert_spt_string_to_code(#[case] spt: &str, #[case] expected: f64) {
        assert_relative_eq!(convert_spt_string_to_code(spt).unwrap(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_exact_codes() {
        assert_eq!(convert_spt_string_to_code("M5.6").unwrap(), 65.6);
        assert_eq!(convert_spt_string_to_code("T0.1").unwrap(), 80.1);
        assert_eq!(convert_spt_string_to_code("Y2pec").unwrap(), 92.0);
    }

    #[rstest]
    #[case("K5")]
    #[case("M")]
    #[case("Lpec")]
    #[case("")]
    #[case("sd")]
    #[case("M10")]
    #[case("T5.")]
    fn test_unparseable_spectral_types(#[case] spt: &str) {
        assert!(matches!(
            convert_spt_string_to_code(spt),
            Err(IngestError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_keeps_prefix_and_suffix() {
        let spt: SpectralType = "sdL4.5 pec".parse().unwrap();
        assert_eq!(spt.prefix.as_deref(), Some("sd"));
        assert_eq!(spt.class, SpectralClass::L);
        assert_eq!(spt.decimals, 1);
        assert_eq!(spt.suffix.as_deref(), Some("pec"));
    }

    #[test]
    fn test_convert_spt_code_to_string() {
        assert_eq!(convert_spt_code_to_string(65.6, DEFAULT_DECIMALS).unwrap(), "M5.6");
        assert_eq!(convert_spt_code_to_string(80.1, DEFAULT_DECIMALS).unwrap(), "T0.1");
        assert_eq!(convert_spt_code_to_string(92.0, 0).unwrap(), "Y2");
        assert_eq!(convert_spt_code_to_string(65.6, 0).unwrap(), "M5");
        assert_eq!(convert_spt_code_to_string(70.0, 2).unwrap(), "L0.00");
        assert_eq!(convert_spt_code_to_string(69.96, 1).unwrap(), "L0.0");
    }

    #[test]
    fn test_wide_precision_is_clamped() {
        assert_eq!(convert_spt_code_to_string(65.6, 400).unwrap(), "M5.6000000000");
        assert_eq!(
            convert_spt_code_to_string(65.6, usize::MAX).unwrap(),
            convert_spt_code_to_string(65.6, MAX_DECIMALS).unwrap()
        );
    }

    #[rstest]
    #[case(59.9)]
    #[case(100.0)]
    #[case(99.96)]
    #[case(f64::NAN)]
    #[case(-65.0)]
    fn test_code_out_of_range(#[case] code: f64) {
        assert!(matches!(
            convert_spt_code_to_string(code, DEFAULT_DECIMALS),
            Err(IngestError::Range { .. })
        ));
    }

    #[test]
    fn test_string_code_string_keeps_class_and_subtype() {
        for letter in ['M', 'L', 'T', 'Y'] {
            for tenths in 0..100 {
                let spt = format!("{letter}{}.{}pec", tenths / 10, tenths % 10);
                let code = convert_spt_string_to_code(&spt).unwrap();
                let back = convert_spt_code_to_string(code, 1).unwrap();
                assert_eq!(back, spt.trim_end_matches("pec"), "round trip of {spt}");
            }
        }
    }

    #[test]
    fn test_codes_are_monotonic() {
        let ordered = ["M0", "M9.5", "L0", "L3.5", "T0.1", "T8", "Y0", "Y2pec"];
        let codes: Vec<f64> = ordered
            .iter()
            .map(|s| convert_spt_string_to_code(s).unwrap())
            .collect();
        assert!(codes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ingest_spectral_type_rejects_bad_string_without_writing() {
        let mut db = Database::default();
        let err = ingest_spectral_type(&mut db, "Fake 1", "K5", "Ref 1", "nir").unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
        assert!(db.spectral_types.is_empty());
    }

    #[rstest]
    #[case("", "Ref 1", "nir")]
    #[case("Fake 1", "  ", "nir")]
    #[case("Fake 1", "Ref 1", "")]
    fn test_ingest_spectral_type_requires_names(
        #[case] source: &str,
        #[case] reference: &str,
        #[case] regime: &str,
    ) {
        let mut db = Database::default();
        let err = ingest_spectral_type(&mut db, source, "M5", reference, regime).unwrap_err();
        assert!(matches!(err, IngestError::MissingParameter { .. }));
        assert!(db.spectral_types.is_empty());
    }

    #[test]
    fn test_ingest_spectral_type_trims_names() {
        let mut db = Database::default();
        ingest_spectral_type(&mut db, " Fake 1 ", "M5", "Ref 1 ", " nir").unwrap();
        let row = &db.spectral_types.rows()[0];
        assert_eq!((row.source.as_str(), row.reference.as_str(), row.regime.as_str()), ("Fake 1", "Ref 1", "nir"));
        assert!(matches!(
            ingest_spectral_type(&mut db, "Fake 1", "M6", "Ref 1", "nir"),
            Err(IngestError::DuplicateEntry(_))
        ));
    }

    #[test]
    fn test_first_spectral_type_is_adopted() {
        let mut db = Database::default();
        ingest_spectral_type(&mut db, "Fake 1", "L2", "Ref 1", "optical").unwrap();
        ingest_spectral_type(&mut db, "Fake 1", "L3", "Ref 1", "nir").unwrap();
        let adopted: Vec<bool> = db.spectral_types.rows().iter().map(|r| r.adopted).collect();
        assert_eq!(adopted, vec![true, false]);
    }
}
