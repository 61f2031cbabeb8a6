//! Export serializer
//!
//! Builds one document from the selected categories. Keys always follow the
//! category rank, whatever order the selection was built in, so the output can
//! be fed straight back to the importer.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Serializer, Value};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::category;
use crate::store::{CategoryStore, StoreError};

#[derive(Debug, Error)]
pub enum ExportError {
    /// A category could not be read; no partial document is produced
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Serialization failed: {0}")]
    Serialize(String),
}

/// Category names switched on in a name → flag map
pub fn selected(flags: &BTreeMap<String, bool>) -> BTreeSet<String> {
    flags
        .iter()
        .filter(|(_, on)| **on)
        .map(|(name, _)| name.clone())
        .collect()
}

/// Collect the selected categories into an ordered JSON object
///
/// Unknown names in `selection` are ignored.
pub fn export_document(
    store: &dyn CategoryStore,
    selection: &BTreeSet<String>,
) -> Result<Map<String, Value>, ExportError> {
    let mut document = Map::new();
    for category in category::all() {
        if !selection.contains(category.name) {
            continue;
        }
        let entities = store.list(category)?;
        debug!(category = %category, count = entities.len(), "Exporting category");
        document.insert(category.name.to_string(), Value::Array(entities));
    }
    Ok(document)
}

/// Render a document; `indent == 0` gives compact output
pub fn render(document: &Map<String, Value>, indent: usize) -> Result<String, ExportError> {
    if indent == 0 {
        return serde_json::to_string(document).map_err(|e| ExportError::Serialize(e.to_string()));
    }

    let indent_bytes = vec![b' '; indent];
    let mut serializer =
        Serializer::with_formatter(Vec::new(), PrettyFormatter::with_indent(&indent_bytes));
    document
        .serialize(&mut serializer)
        .map_err(|e| ExportError::Serialize(e.to_string()))?;
    String::from_utf8(serializer.into_inner()).map_err(|e| ExportError::Serialize(e.to_string()))
}

/// Export the selected categories as document text
pub fn export(
    store: &dyn CategoryStore,
    selection: &BTreeSet<String>,
    indent: usize,
) -> Result<String, ExportError> {
    let document = export_document(store, selection)?;
    let text = render(&document, indent)?;
    info!(
        categories = document.len(),
        bytes = text.len(),
        "Export document created"
    );
    Ok(text)
}
