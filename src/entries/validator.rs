/// Coercion of submitted entry values against a category's field definitions
use super::value::{FieldValue, ValueMap};
use crate::{
    error::{TrackerError, TrackerResult},
    schema::{Category, DataType},
};
use serde_json::{Map, Value};

/// Coerce raw submitted values into a storable value map.
///
/// Number fields get a numeric parse attempt and fall back to the original
/// text when it fails. Text fields are stored as strings. Labels the category
/// does not declare are kept as submitted. `null` values are dropped.
///
/// Declared fields come first in category order, followed by any extra labels
/// in submission order.
pub fn validate_and_coerce(category: &Category, raw: &Map<String, Value>) -> TrackerResult<ValueMap> {
    if let Some((label, _)) = raw
        .iter()
        .find(|(_, value)| matches!(value, Value::Array(_) | Value::Object(_)))
    {
        return Err(TrackerError::Validation(format!(
            "Value for '{}' must be a string, number or boolean",
            label
        )));
    }

    let declared = category
        .fields
        .iter()
        .filter_map(|field| raw.get(&field.label).map(|value| (&field.label, value)));
    let extra = raw.iter().filter(|(label, _)| category.field(label).is_none());

    let mut values = ValueMap::with_capacity(raw.len());

    for (label, value) in declared.chain(extra) {
        let coerced = match category.field(label).map(|f| f.data_type) {
            Some(DataType::Number) => coerce_number(value),
            Some(DataType::Text) => coerce_text(value),
            None => passthrough(value),
        };

        if let Some(coerced) = coerced {
            if let FieldValue::Raw(ref original) = coerced {
                tracing::debug!(
                    category_id = category.id,
                    label = %label,
                    value = %original,
                    "Kept non-numeric input for number field as text"
                );
            }
            values.insert(label.clone(), coerced);
        }
    }

    Ok(values)
}

fn coerce_number(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null => None,
        Value::Number(n) => Some(match n.as_f64().filter(|f| f.is_finite()) {
            Some(f) => FieldValue::Number(f),
            None => FieldValue::Raw(n.to_string()),
        }),
        Value::String(s) => Some(match parse_number(s) {
            Some(f) => FieldValue::Number(f),
            None => FieldValue::Raw(s.clone()),
        }),
        Value::Bool(b) => Some(FieldValue::Raw(b.to_string())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn coerce_text(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        Value::String(s) => Some(FieldValue::Text(s.clone())),
        other => Some(FieldValue::Text(other.to_string())),
    }
}

fn passthrough(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        Value::String(s) => Some(FieldValue::Text(s.clone())),
        Value::Bool(b) => Some(FieldValue::Bool(*b)),
        Value::Number(n) => Some(match n.as_f64().filter(|f| f.is_finite()) {
            Some(f) => FieldValue::Number(f),
            None => FieldValue::Text(n.to_string()),
        }),
    }
}

/// Parse a finite decimal number, ignoring surrounding whitespace
pub fn parse_number(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
}
