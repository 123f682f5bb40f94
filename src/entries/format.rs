/// Human-readable rendering of entry values
use super::value::{FieldValue, ValueMap};
use crate::schema::Category;
use indexmap::IndexMap;

/// Label to rendered string, in category field order
pub type DisplayMap = IndexMap<String, String>;

/// Render one value with an optional unit suffix
pub fn render_value(value: &FieldValue, unit: Option<&str>) -> String {
    match unit.filter(|u| !u.is_empty()) {
        Some(unit) => format!("{} {}", value, unit),
        None => value.to_string(),
    }
}

/// Render every value of an entry, using units from the category when known.
///
/// Declared fields are listed in category order; labels the category does not
/// know follow in stored order.
pub fn render(category: Option<&Category>, values: &ValueMap) -> DisplayMap {
    let mut display = DisplayMap::with_capacity(values.len());

    if let Some(category) = category {
        for field in &category.fields {
            if let Some(value) = values.get(&field.label) {
                display.insert(field.label.clone(), render_value(value, field.display_unit()));
            }
        }
    }

    for (label, value) in values {
        if !display.contains_key(label) {
            display.insert(label.clone(), render_value(value, None));
        }
    }

    display
}
