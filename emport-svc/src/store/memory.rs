//! In-memory category store
//!
//! Entities are kept per category in insertion order and upserted by the
//! category's key field, with a key → position index so each apply is a
//! constant number of lookups. References to other categories are resolved
//! against what is already stored, so applying a document out of rank order
//! fails the same way a real backend would.
//!
//! Lock poisoning is recovered from in every accessor: each write replaces or
//! appends one entity and updates the index before releasing the guard.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use super::{ApplyResult, CategoryStore, StoreError};
use crate::models::{Category, ImportDocument, Reference, ValueKind};

/// Entities of one category plus their key index
#[derive(Debug, Default)]
struct CategoryTable {
    entities: Vec<Value>,
    positions: HashMap<String, usize>,
}

impl CategoryTable {
    fn get(&self, key: &str) -> Option<&Value> {
        self.positions.get(key).map(|&position| &self.entities[position])
    }

    fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    /// Returns true when an existing entity was replaced
    fn upsert(&mut self, key: &str, entity: Value) -> bool {
        match self.positions.get(key) {
            Some(&position) => {
                self.entities[position] = entity;
                true
            }
            None => {
                self.positions.insert(key.to_string(), self.entities.len());
                self.entities.push(entity);
                false
            }
        }
    }
}

type Tables = HashMap<&'static str, CategoryTable>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an export document
    ///
    /// Items are applied in rank order. Rejected items are logged and skipped.
    /// Returns the store and the number of entities loaded.
    pub fn from_document(document: ImportDocument) -> (Self, usize) {
        let store = Self::new();
        let mut loaded = 0;
        for item in document.into_work_list() {
            match store.apply(item.category, &item.entity) {
                ApplyResult::Applied => loaded += 1,
                ApplyResult::ValidationFailed(reason) | ApplyResult::FatalError(reason) => {
                    warn!(
                        category = %item.category,
                        index = item.index,
                        reason = %reason,
                        "Skipping seed entity"
                    );
                }
            }
        }
        (store, loaded)
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored entities in `category`
    pub fn count(&self, category: &Category) -> usize {
        self.read()
            .get(category.name)
            .map_or(0, |table| table.entities.len())
    }

    /// Stored entity of `category` with key `key`
    pub fn get(&self, category: &Category, key: &str) -> Option<Value> {
        self.read().get(category.name)?.get(key).cloned()
    }
}

/// Check one reference field against the stored entities
fn check_reference(tables: &Tables, reference: &Reference, entity: &Value) -> Result<(), String> {
    let Some(target) = crate::models::category::lookup(reference.target) else {
        return Err(format!("unknown reference target '{}'", reference.target));
    };

    let keys: Vec<&str> = match entity.get(reference.field) {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::String(key)) => vec![key.as_str()],
        Some(Value::Array(values)) => {
            let mut keys = Vec::with_capacity(values.len());
            for value in values {
                match value.as_str() {
                    Some(key) => keys.push(key),
                    None => {
                        return Err(format!(
                            "'{}' must contain only strings, found {}",
                            reference.field,
                            ValueKind::of(value)
                        ))
                    }
                }
            }
            keys
        }
        Some(other) => {
            return Err(format!(
                "'{}' must be a string or an array of strings, found {}",
                reference.field,
                ValueKind::of(other)
            ))
        }
    };

    let table = tables.get(target.name);
    match keys
        .into_iter()
        .find(|key| !table.is_some_and(|t| t.contains(key)))
    {
        Some(missing) => Err(format!(
            "{} '{}' does not match any {}",
            reference.field, missing, target.name
        )),
        None => Ok(()),
    }
}

impl CategoryStore for MemoryStore {
    fn list(&self, category: &Category) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .read()
            .get(category.name)
            .map(|table| table.entities.clone())
            .unwrap_or_default())
    }

    fn apply(&self, category: &Category, entity: &Value) -> ApplyResult {
        if !entity.is_object() {
            return ApplyResult::ValidationFailed(format!(
                "entity must be an object, found {}",
                ValueKind::of(entity)
            ));
        }
        let Some(key) = category.key_of(entity) else {
            return ApplyResult::ValidationFailed(format!(
                "missing required field '{}'",
                category.key_field
            ));
        };

        let mut tables = self.write();
        for reference in category.references {
            if let Err(reason) = check_reference(&tables, reference, entity) {
                return ApplyResult::ValidationFailed(reason);
            }
        }

        let replaced = tables
            .entry(category.name)
            .or_default()
            .upsert(key, entity.clone());
        if replaced {
            debug!(category = %category, key = %key, "Updating entity");
        } else {
            debug!(category = %category, key = %key, "Creating entity");
        }
        ApplyResult::Applied
    }
}
