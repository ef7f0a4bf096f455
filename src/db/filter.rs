use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::model::FieldValue;

// ---------------------------------------------------------------------------
// Column predicates
// ---------------------------------------------------------------------------

/// A comparison applied to one column.
///
/// Serialized with an `op` tag, e.g. `{"op": "lt", "value": 80}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    Eq { value: FieldValue },
    In { values: Vec<FieldValue> },
    Ge { value: f64 },
    Lt { value: f64 },
    Like { pattern: String },
}

/// One `column <op> value` clause. A list of filters is combined with AND.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    #[serde(flatten)]
    pub predicate: Predicate,
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<FieldValue>) -> Self {
        Filter {
            column: column.to_string(),
            predicate: Predicate::Eq {
                value: value.into(),
            },
        }
    }

    pub fn is_in<V: Into<FieldValue>>(column: &str, values: impl IntoIterator<Item = V>) -> Self {
        Filter {
            column: column.to_string(),
            predicate: Predicate::In {
                values: values.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn ge(column: &str, value: f64) -> Self {
        Filter {
            column: column.to_string(),
            predicate: Predicate::Ge { value },
        }
    }

    pub fn lt(column: &str, value: f64) -> Self {
        Filter {
            column: column.to_string(),
            predicate: Predicate::Lt { value },
        }
    }

    pub fn like(column: &str, pattern: &str) -> Self {
        Filter {
            column: column.to_string(),
            predicate: Predicate::Like {
                pattern: pattern.to_string(),
            },
        }
    }

    /// Whether a single cell satisfies this clause.
    pub fn matches(&self, value: &FieldValue) -> bool {
        match &self.predicate {
            Predicate::Eq { value: wanted } => value.loose_eq(wanted),
            Predicate::In { values } => values.iter().any(|v| value.loose_eq(v)),
            // Nulls never satisfy a range bound.
            Predicate::Ge { value: bound } => value.as_f64().is_some_and(|v| v >= *bound),
            Predicate::Lt { value: bound } => value.as_f64().is_some_and(|v| v < *bound),
            Predicate::Like { pattern } => match value {
                FieldValue::Null => false,
                other => like_match(pattern, &other.to_string()),
            },
        }
    }
}

/// Return true when a serialized row passes all filters.
///
/// A row passes a filter when:
/// * the column exists and its value satisfies the predicate, or
/// * the column is absent and the predicate accepts `Null`.
pub fn row_matches(row: &JsonValue, filters: &[Filter]) -> bool {
    filters.iter().all(|f| {
        let value = row
            .get(&f.column)
            .map(FieldValue::from_json)
            .unwrap_or(FieldValue::Null);
        f.matches(&value)
    })
}

/// SQL `LIKE`: `%` matches any run of characters, `_` exactly one.
/// ASCII letters compare case-insensitively, as in SQLite.
pub fn like_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    // Iterative wildcard matching with single-star backtracking.
    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while ti < t.len() {
        if pi < p.len() && p[pi] == '%' {
            star = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && (p[pi] == '_' || p[pi].eq_ignore_ascii_case(&t[ti])) {
            pi += 1;
            ti += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '%')
}
