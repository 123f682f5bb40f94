/// Adapter for the older `/api` client, which addresses categories as
/// `cat_<id>` and timestamps as epoch milliseconds.
use super::{
    format::{render, DisplayMap},
    Entry,
};
use crate::{
    error::{TrackerError, TrackerResult},
    schema::{Category, CreateCategoryRequest, FieldSpec},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const CATEGORY_PREFIX: &str = "cat_";

/// Parse a `cat_<id>` reference into a category id
pub fn resolve_category_ref(reference: &str) -> TrackerResult<i64> {
    let invalid = || TrackerError::InvalidType(reference.to_string());

    let digits = reference.strip_prefix(CATEGORY_PREFIX).ok_or_else(invalid)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    digits.parse().map_err(|_| invalid())
}

pub fn category_ref(category_id: i64) -> String {
    format!("{}{}", CATEGORY_PREFIX, category_id)
}

/// Convert epoch milliseconds into a UTC timestamp
pub fn from_millis(millis: i64) -> TrackerResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| TrackerError::Validation(format!("Timestamp {} is out of range", millis)))
}

/// Entry as submitted by the legacy client
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyEntryRequest {
    #[serde(rename = "type")]
    pub category_ref: String,
    pub timestamp: i64,
    #[serde(default)]
    pub details: Map<String, Value>,
}

/// Entry as returned to the legacy client
#[derive(Debug, Clone, Serialize)]
pub struct LegacyEntry {
    pub id: i64,
    #[serde(rename = "type")]
    pub category_ref: String,
    pub text: String,
    pub details: DisplayMap,
    pub timestamp: i64,
}

impl LegacyEntry {
    pub fn from_entry(entry: &Entry, category: Option<&Category>) -> Self {
        Self {
            id: entry.id,
            category_ref: category_ref(entry.category_id),
            text: category.map(|c| c.name.clone()).unwrap_or_default(),
            details: render(category, &entry.data),
            timestamp: entry.occurred_at.timestamp_millis(),
        }
    }
}

/// Category as submitted by the legacy client
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl From<LegacyCategoryRequest> for CreateCategoryRequest {
    fn from(request: LegacyCategoryRequest) -> Self {
        CreateCategoryRequest {
            name: request.name,
            description: request.desc,
            fields: request.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::{FieldValue, ValueMap};

    #[test]
    fn test_resolve_category_ref() {
        assert_eq!(resolve_category_ref("cat_12").unwrap(), 12);
        assert_eq!(category_ref(12), "cat_12");

        for bad in ["12", "cat_", "cat_x", "cat_-1", "dog_3", "cat_1.5", ""] {
            assert!(
                matches!(resolve_category_ref(bad), Err(TrackerError::InvalidType(_))),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_legacy_entry_shape() {
        let occurred_at = from_millis(1_700_000_000_123).unwrap();
        let mut data = ValueMap::new();
        data.insert("Laune".to_string(), FieldValue::Number(7.0));
        let entry = Entry {
            id: 3,
            category_id: 9,
            occurred_at,
            created_at: occurred_at,
            note: None,
            data,
        };

        let legacy = LegacyEntry::from_entry(&entry, None);
        let json = serde_json::to_value(&legacy).unwrap();
        assert_eq!(json["type"], "cat_9");
        assert_eq!(json["timestamp"], 1_700_000_000_123i64);
        assert_eq!(json["details"]["Laune"], "7");
    }

    #[test]
    fn test_legacy_category_uses_desc() {
        let request: LegacyCategoryRequest = serde_json::from_str(
            r#"{"name":"Lesen","desc":"Bücher","fields":[{"label":"Seiten","data_type":"number"}]}"#,
        )
        .unwrap();
        let request = CreateCategoryRequest::from(request);
        assert_eq!(request.description.as_deref(), Some("Bücher"));
        assert_eq!(request.fields[0].data_type, "number");
    }
}
