/// Tracked entries: value coercion, rendering and storage
pub mod format;
pub mod legacy;
pub mod store;
pub mod timestamp;
pub mod validator;
pub mod value;

pub use format::{render, DisplayMap};
pub use store::EntryStore;
pub use validator::validate_and_coerce;
pub use value::{FieldValue, ValueMap};

use crate::{db::models::EntryRow, schema::Category};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub id: i64,
    pub category_id: i64,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub note: Option<String>,
    pub data: ValueMap,
}

impl From<EntryRow> for Entry {
    fn from(row: EntryRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            occurred_at: row.occurred_at,
            created_at: row.created_at,
            note: row.note,
            data: row.data.0,
        }
    }
}

/// Entry as returned by the API, with rendered values alongside the typed ones
#[derive(Debug, Clone, Serialize)]
pub struct EntryOut {
    #[serde(flatten)]
    pub entry: Entry,
    pub display: DisplayMap,
}

impl EntryOut {
    pub fn new(entry: Entry, category: Option<&Category>) -> Self {
        let display = render(category, &entry.data);
        Self { entry, display }
    }
}

/// Entry payload for create and update
#[derive(Debug, Clone, Deserialize)]
pub struct NewEntry {
    pub category_id: i64,
    /// Defaults to the time of the request; zone-less values are UTC
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default, alias = "data")]
    pub values: Map<String, Value>,
}

/// Optional filters for listing entries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryFilter {
    pub category_id: Option<i64>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub end: Option<DateTime<Utc>>,
}
