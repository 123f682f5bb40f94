/// Built-in categories seeded for every new account
use super::{DataType, NewField};

/// Template for a system default category
#[derive(Debug, Clone, Copy)]
pub struct DefaultCategory {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: &'static [(&'static str, DataType, Option<&'static str>)],
}

impl DefaultCategory {
    pub fn new_fields(&self) -> Vec<NewField> {
        self.fields
            .iter()
            .map(|(label, data_type, unit)| NewField {
                label: label.to_string(),
                data_type: *data_type,
                unit: unit.map(str::to_string),
            })
            .collect()
    }
}

pub const DEFAULT_CATEGORIES: &[DefaultCategory] = &[
    DefaultCategory {
        name: "Fitness",
        description: "Hier kannst du dein Training tracken.",
        fields: &[
            ("Übung", DataType::Text, None),
            ("Dauer", DataType::Number, Some("Minuten")),
            ("Strecke", DataType::Number, Some("km")),
            ("Gewicht", DataType::Number, Some("kg")),
            ("Energie", DataType::Number, Some("kcal")),
        ],
    },
    DefaultCategory {
        name: "Ernährung",
        description: "Hier kannst du deine Ernährung tracken.",
        fields: &[
            ("Lebensmittel", DataType::Text, None),
            ("Gewicht", DataType::Number, Some("g")),
            ("Energie", DataType::Number, Some("kcal")),
        ],
    },
    DefaultCategory {
        name: "Tagebuch",
        description: "Hier kannst du deine Stimmung tracken.",
        fields: &[
            ("Laune", DataType::Number, Some("/10")),
            ("Highlight", DataType::Text, None),
        ],
    },
    DefaultCategory {
        name: "Schlaf",
        description: "Hier kannst du deinen Schlaf tracken.",
        fields: &[
            ("Dauer", DataType::Number, Some("Stunden")),
            ("Erholung", DataType::Number, Some("/10")),
        ],
    },
];
