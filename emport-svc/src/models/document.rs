//! Import document model
//!
//! Wraps the parsed JSON value of an import payload. Entities stay as opaque
//! `serde_json::Value`s: only the top-level shape is checked here, entity
//! content is the category store's business.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use super::category::{self, Category};

/// Shape of a JSON value, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Bool,
            Value::Null => Self::Null,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "boolean",
            Self::Null => "null",
        };
        f.write_str(name)
    }
}

/// Structural problems with an import payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Text is not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Valid JSON, but the top level is not an object
    #[error("Invalid import data: expected an object at the top level, found {0}")]
    NotAnObject(ValueKind),
}

/// One entity to apply, tagged with its category and document position
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub category: &'static Category,
    pub entity: Value,
    pub index: usize,
}

/// A structurally valid import document
#[derive(Debug, Clone)]
pub struct ImportDocument {
    root: Map<String, Value>,
}

impl ImportDocument {
    /// Parse import text
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| DocumentError::Parse(e.to_string()))?;
        Self::from_value(value)
    }

    /// Accept an already parsed value
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(DocumentError::NotAnObject(ValueKind::of(&other))),
        }
    }

    /// Top-level keys that name no known category
    pub fn unknown_keys(&self) -> Vec<&str> {
        self.root
            .keys()
            .map(String::as_str)
            .filter(|key| category::lookup(key).is_none())
            .collect()
    }

    /// Flatten into the work list: category rank first, then document order
    ///
    /// Unknown keys are skipped. A known key whose value is not an array
    /// contributes no items.
    pub fn into_work_list(mut self) -> Vec<WorkItem> {
        for key in self.unknown_keys() {
            debug!(key = %key, "Skipping unknown import category");
        }

        let mut items = Vec::new();
        for category in category::all() {
            match self.root.remove(category.name) {
                Some(Value::Array(entities)) => {
                    items.extend(
                        entities
                            .into_iter()
                            .enumerate()
                            .map(|(index, entity)| WorkItem {
                                category,
                                entity,
                                index,
                            }),
                    );
                }
                Some(other) => {
                    warn!(
                        category = %category,
                        found = %ValueKind::of(&other),
                        "Import category is not an array, ignoring it"
                    );
                }
                None => {}
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            ImportDocument::parse("not an object"),
            Err(DocumentError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert_eq!(
            ImportDocument::parse("[1, 2]").unwrap_err(),
            DocumentError::NotAnObject(ValueKind::Array)
        );
        assert_eq!(
            ImportDocument::parse("\"users\"").unwrap_err(),
            DocumentError::NotAnObject(ValueKind::String)
        );
    }

    #[test]
    fn test_work_list_follows_rank_then_index() {
        let doc = ImportDocument::from_value(json!({
            "pointLinks": [{"xid": "PL_1"}],
            "dataPoints": [{"xid": "DP_1"}, {"xid": "DP_2"}],
            "users": [{"username": "admin"}],
            "dataSources": [{"xid": "DS_1"}],
        }))
        .unwrap();

        let order: Vec<_> = doc
            .into_work_list()
            .iter()
            .map(|item| (item.category.name, item.index))
            .collect();

        assert_eq!(
            order,
            vec![
                ("users", 0),
                ("dataSources", 0),
                ("dataPoints", 0),
                ("dataPoints", 1),
                ("pointLinks", 0),
            ]
        );
    }

    #[test]
    fn test_unknown_and_malformed_categories_contribute_nothing() {
        let doc = ImportDocument::from_value(json!({
            "systemSettings": [{"a": 1}],
            "users": {"username": "not-in-an-array"},
            "dataSources": [{"xid": "DS_1"}],
        }))
        .unwrap();

        assert_eq!(doc.unknown_keys(), vec!["systemSettings"]);

        let items = doc.into_work_list();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category.name, "dataSources");
    }

    #[test]
    fn test_empty_object_is_valid() {
        let doc = ImportDocument::parse("{}").unwrap();
        assert!(doc.into_work_list().is_empty());
    }
}
