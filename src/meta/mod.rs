// src/meta/mod.rs

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Declared column type from `resource_show`. Everything that is not a
/// datetime is handled generically downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Datetime,
    #[serde(other)]
    Other,
}

/// One column's metadata as declared by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
    /// Date format using the tokens `YYYY`, `MM`, `[Q]Q`; only present on
    /// datetime fields.
    #[serde(default)]
    pub format: Option<String>,
    /// Sentinel token -> occurrence info. The literal key `count` is
    /// bookkeeping, not a sentinel.
    #[serde(default)]
    pub null_values: HashMap<String, Value>,
}

/// `resource_show` result payload: display name plus the ordered column
/// descriptors.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceMetadata {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl ResourceMetadata {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Datetime descriptors in declaration order. The first one doubles as
    /// the sort key for the data fetch.
    pub fn datetime_fields(&self) -> Vec<&FieldDescriptor> {
        self.fields
            .iter()
            .filter(|f| f.ty == FieldType::Datetime)
            .collect()
    }

    /// Null sentinel tokens declared for `column`, excluding the `count`
    /// bookkeeping key. Empty when the column has no descriptor.
    pub fn null_sentinels(&self, column: &str) -> Vec<String> {
        self.field(column)
            .map(|f| {
                f.null_values
                    .keys()
                    .filter(|k| k.as_str() != "count")
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ResourceMetadata {
        serde_json::from_value(json!({
            "name": "Consumer Price Index",
            "fields": [
                {"name": "quarter", "type": "datetime", "format": "YYYY-[Q]Q"},
                {"name": "value", "type": "numeric", "null_values": {"na": 3, "count": 3}},
                {"name": "category", "type": "text"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn datetime_fields_in_order() {
        let meta = sample();
        let names: Vec<_> = meta.datetime_fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["quarter"]);
        assert_eq!(meta.datetime_fields()[0].format.as_deref(), Some("YYYY-[Q]Q"));
    }

    #[test]
    fn unknown_types_collapse_to_other() {
        let meta = sample();
        assert_eq!(meta.field("value").unwrap().ty, FieldType::Other);
        assert_eq!(meta.field("category").unwrap().ty, FieldType::Other);
        assert_eq!(meta.field("quarter").unwrap().ty, FieldType::Datetime);
    }

    #[test]
    fn null_sentinels_exclude_count_key() {
        let meta = sample();
        assert_eq!(meta.null_sentinels("value"), vec!["na".to_string()]);
        assert!(meta.null_sentinels("category").is_empty());
        assert!(meta.null_sentinels("no_such_column").is_empty());
    }
}
