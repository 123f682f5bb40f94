/// Stored entry values
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Label to value map persisted with every entry, in field order
pub type ValueMap = IndexMap<String, FieldValue>;

/// One stored value.
///
/// `Raw` keeps input that was meant to be numeric but did not parse; it is
/// written as a plain JSON string, so it reads back as `Text`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Bool(bool),
    Text(String),
    #[serde(skip_deserializing)]
    Raw(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Raw(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Number(n) => match as_integer(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Text(s) | FieldValue::Raw(s) => serializer.serialize_str(s),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => f.write_str(&format_number(*n)),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Text(s) | FieldValue::Raw(s) => f.write_str(s),
        }
    }
}

/// Render a number without a trailing `.0` when it is integral
pub fn format_number(n: f64) -> String {
    match as_integer(n) {
        Some(i) => i.to_string(),
        None => n.to_string(),
    }
}

// 2^53: beyond this f64 no longer represents every integer
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

fn as_integer(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Some(n as i64)
    } else {
        None
    }
}
