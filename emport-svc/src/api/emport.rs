//! Export/import API handlers
//!
//! POST /emport/export, POST /emport/import, GET /emport/import/status,
//! POST /emport/import/cancel
//!
//! Every import call is scoped to the requesting owner (see [`Owner`]).

use axum::{
    extract::{DefaultBodyLimit, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::owner::Owner;
use crate::error::{ApiError, ApiResult};
use crate::models::{ImportMessage, ImportStatus};
use crate::services::{self, PollOutcome};
use crate::AppState;

/// POST /emport/export request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Pretty-print indent; configured default when omitted, 0 for compact
    #[serde(default)]
    pub indent: Option<usize>,
    /// Category name → include flag
    #[serde(default)]
    pub selection: BTreeMap<String, bool>,
}

/// POST /emport/import request
#[derive(Debug, Deserialize)]
pub struct StartImportRequest {
    /// Document text as produced by export
    pub data: String,
}

/// POST /emport/import response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartImportResponse {
    pub started: bool,
    pub task_id: Uuid,
    pub total_count: usize,
}

/// GET /emport/import/status response
///
/// Exactly one of `noImport`, `running`, `complete`, `cancelled` is set.
/// A failed import is reported as `complete` with `failed` set.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatusResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_import: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ImportMessage>>,
}

impl From<PollOutcome> for ImportStatusResponse {
    fn from(outcome: PollOutcome) -> Self {
        let snapshot = match outcome {
            PollOutcome::NoImport => {
                return Self {
                    no_import: Some(true),
                    ..Self::default()
                }
            }
            PollOutcome::Task(snapshot) => snapshot,
        };

        let mut response = Self {
            task_id: Some(snapshot.task_id),
            processed_count: Some(snapshot.processed_count),
            total_count: Some(snapshot.total_count),
            messages: Some(snapshot.messages),
            ..Self::default()
        };
        match snapshot.status {
            ImportStatus::Running => response.running = Some(true),
            ImportStatus::Completed => response.complete = Some(true),
            ImportStatus::Failed => {
                response.complete = Some(true);
                response.failed = Some(true);
            }
            ImportStatus::Cancelled => response.cancelled = Some(true),
        }
        response
    }
}

/// POST /emport/import/cancel response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelImportResponse {
    pub acknowledged: bool,
    pub task_found: bool,
}

/// POST /emport/export
///
/// Returns the document text. The store is read on the blocking pool.
pub async fn export_data(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> ApiResult<impl IntoResponse> {
    let indent = request.indent.unwrap_or(state.default_indent);
    let selection = services::export::selected(&request.selection);
    let store = state.coordinator.store().clone();

    tracing::debug!(?selection, indent, "Export requested");

    let text = tokio::task::spawn_blocking(move || {
        services::export(store.as_ref(), &selection, indent)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Export task aborted: {}", e)))??;

    Ok(([(header::CONTENT_TYPE, "application/json")], text))
}

/// POST /emport/import
///
/// Returns as soon as the task is registered; progress is read via status.
pub async fn start_import(
    State(state): State<AppState>,
    owner: Owner,
    Json(request): Json<StartImportRequest>,
) -> ApiResult<Json<StartImportResponse>> {
    let started = state
        .coordinator
        .start_import(&request.data, owner.as_str())
        .map_err(|e| {
            tracing::info!(owner = %owner, error = %e, "Import refused");
            ApiError::from(e)
        })?;

    Ok(Json(StartImportResponse {
        started: true,
        task_id: started.task_id,
        total_count: started.total,
    }))
}

/// GET /emport/import/status
///
/// A terminal result is delivered once; the next poll reports `noImport`.
pub async fn import_status(
    State(state): State<AppState>,
    owner: Owner,
) -> Json<ImportStatusResponse> {
    Json(state.coordinator.poll(owner.as_str()).into())
}

/// POST /emport/import/cancel
///
/// Advisory: the worker stops before its next item.
pub async fn cancel_import(
    State(state): State<AppState>,
    owner: Owner,
) -> Json<CancelImportResponse> {
    let task_found = state.coordinator.cancel(owner.as_str());
    Json(CancelImportResponse {
        acknowledged: true,
        task_found,
    })
}

/// Build export/import routes
///
/// The import route accepts bodies up to `max_import_bytes` instead of axum's
/// 2 MB default, since it receives whole export documents.
pub fn emport_routes(max_import_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/emport/export", post(export_data))
        .route(
            "/emport/import",
            post(start_import).layer(DefaultBodyLimit::max(max_import_bytes)),
        )
        .route("/emport/import/status", get(import_status))
        .route("/emport/import/cancel", post(cancel_import))
}
