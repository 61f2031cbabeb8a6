//! emport-svc library interface
//!
//! Configuration export/import service: builds export documents from the
//! category store and runs imports as background tasks scoped to one owner.

pub mod api;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use emport_common::config::DEFAULT_MAX_IMPORT_BYTES;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::models::ImportDocument;
use crate::services::{ImportCoordinator, TaskRegistry};
use crate::store::{CategoryStore, MemoryStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Import start/poll/cancel, plus the store used for export
    pub coordinator: ImportCoordinator,
    /// Export indent used when a request does not give one
    pub default_indent: usize,
    /// Body size cap for import requests
    pub max_import_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: Arc<dyn CategoryStore>, default_indent: usize) -> Self {
        Self {
            coordinator: ImportCoordinator::new(Arc::new(TaskRegistry::new()), store),
            default_indent,
            max_import_bytes: DEFAULT_MAX_IMPORT_BYTES,
            startup_time: Utc::now(),
        }
    }

    /// Override the import body cap
    ///
    /// Must be at least the size of the largest export that should be
    /// re-importable over HTTP.
    pub fn with_max_import_bytes(mut self, max_import_bytes: usize) -> Self {
        self.max_import_bytes = max_import_bytes;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::emport_routes(state.max_import_bytes))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the in-memory store, loading `seed_file` when given
///
/// The seed file is an export document.
pub fn load_seed_store(seed_file: Option<&Path>) -> emport_common::Result<MemoryStore> {
    let Some(path) = seed_file else {
        return Ok(MemoryStore::new());
    };

    let text = std::fs::read_to_string(path)?;
    let document = ImportDocument::parse(&text).map_err(|e| {
        emport_common::Error::InvalidInput(format!("Seed file {}: {}", path.display(), e))
    })?;
    let (store, loaded) = MemoryStore::from_document(document);
    info!("Loaded {} entities from seed file {}", loaded, path.display());
    Ok(store)
}
