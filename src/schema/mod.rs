/// Category schema registry
///
/// Categories are user-owned tracking domains. Their field definitions live
/// in the database as data, so an entry's shape is only known at runtime by
/// looking up its category.
pub mod defaults;
pub mod registry;

pub use registry::CategoryRegistry;

use crate::error::{TrackerError, TrackerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, str::FromStr};

/// Longest accepted category name or field label
pub const MAX_NAME_LEN: usize = 50;

/// Declared type of a category field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Number,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Number => "number",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(DataType::Text),
            "number" => Ok(DataType::Number),
            other => Err(TrackerError::Validation(format!(
                "Unknown data type '{}', expected 'text' or 'number'",
                other
            ))),
        }
    }
}

/// A field as stored on a category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryField {
    pub id: i64,
    pub label: String,
    pub data_type: DataType,
    pub unit: Option<String>,
}

impl CategoryField {
    /// Unit suffix for display, if one is set
    pub fn display_unit(&self) -> Option<&str> {
        self.unit.as_deref().filter(|u| !u.is_empty())
    }
}

/// A category together with its ordered field definitions
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_system_default: bool,
    pub created_at: DateTime<Utc>,
    pub fields: Vec<CategoryField>,
}

impl Category {
    /// Look up a field by its exact label
    pub fn field(&self, label: &str) -> Option<&CategoryField> {
        self.fields.iter().find(|f| f.label == label)
    }
}

/// Field definition as submitted by a client
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    pub label: String,
    #[serde(default = "default_data_type")]
    pub data_type: String,
    #[serde(default)]
    pub unit: Option<String>,
}

fn default_data_type() -> String {
    DataType::Text.as_str().to_string()
}

/// Field definition after validation, ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewField {
    pub label: String,
    pub data_type: DataType,
    pub unit: Option<String>,
}

impl FieldSpec {
    pub fn validate(&self) -> TrackerResult<NewField> {
        let label = self.label.trim();
        if label.is_empty() {
            return Err(TrackerError::Validation(
                "Field label cannot be empty".to_string(),
            ));
        }
        if label.chars().count() > MAX_NAME_LEN {
            return Err(TrackerError::Validation(format!(
                "Field label '{}' is longer than {} characters",
                label, MAX_NAME_LEN
            )));
        }

        let unit = self
            .unit
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        Ok(NewField {
            label: label.to_string(),
            data_type: self.data_type.parse()?,
            unit,
        })
    }
}

/// Validate a batch of field specs and reject duplicate labels, including
/// clashes with labels the category already has.
pub fn validate_fields<'a>(
    specs: &[FieldSpec],
    existing: impl IntoIterator<Item = &'a str>,
) -> TrackerResult<Vec<NewField>> {
    let mut seen: HashSet<String> = existing.into_iter().map(str::to_string).collect();
    let mut fields = Vec::with_capacity(specs.len());

    for spec in specs {
        let field = spec.validate()?;
        if !seen.insert(field.label.clone()) {
            return Err(TrackerError::Validation(format!(
                "Duplicate field label '{}'",
                field.label
            )));
        }
        fields.push(field);
    }

    Ok(fields)
}

/// Validate a category name
pub fn validate_category_name(name: &str) -> TrackerResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TrackerError::Validation(
            "Category name cannot be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(TrackerError::Validation(format!(
            "Category name is longer than {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

/// Request body for creating a category
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Partial update of a category's metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for appending fields to a category
#[derive(Debug, Clone, Deserialize)]
pub struct AppendFieldsRequest {
    pub fields: Vec<FieldSpec>,
}
