//! Import coordinator
//!
//! Synchronous front half of an import: parse and check the document, claim
//! the owner's registry slot, hand the work list to a blocking-pool worker and
//! return. Never waits for the worker.

use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{error, info};
use uuid::Uuid;

use super::registry::{PollOutcome, RegisterError, TaskRegistry};
use super::worker::run_import;
use crate::models::{DocumentError, ImportDocument, ImportStatus, ImportTask};
use crate::store::CategoryStore;

/// Reasons an import is refused before any task exists
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartImportError {
    /// Text is not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Top level is not an object
    #[error("{0}")]
    InvalidImportData(String),

    /// The owner already has a running import
    #[error(transparent)]
    AlreadyRunning(#[from] RegisterError),

    /// Called outside a tokio runtime
    #[error("No async runtime available to run the import")]
    NoRuntime,
}

impl From<DocumentError> for StartImportError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Parse(msg) => StartImportError::Parse(msg),
            not_object @ DocumentError::NotAnObject(_) => {
                StartImportError::InvalidImportData(not_object.to_string())
            }
        }
    }
}

/// Accepted import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportStarted {
    pub task_id: Uuid,
    pub total: usize,
}

#[derive(Clone)]
pub struct ImportCoordinator {
    registry: Arc<TaskRegistry>,
    store: Arc<dyn CategoryStore>,
}

impl ImportCoordinator {
    pub fn new(registry: Arc<TaskRegistry>, store: Arc<dyn CategoryStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn CategoryStore> {
        &self.store
    }

    /// Validate `raw_text` and start importing it for `owner`
    pub fn start_import(
        &self,
        raw_text: &str,
        owner: &str,
    ) -> Result<ImportStarted, StartImportError> {
        let handle = Handle::try_current().map_err(|_| StartImportError::NoRuntime)?;

        let work_list = ImportDocument::parse(raw_text)?.into_work_list();
        let task = Arc::new(ImportTask::new(owner, work_list.len()));
        self.registry.register(task.clone())?;

        let started = ImportStarted {
            task_id: task.id(),
            total: task.total(),
        };
        info!(
            task_id = %started.task_id,
            owner = %owner,
            total = started.total,
            "Import task registered"
        );

        let store = self.store.clone();
        let worker_task = task.clone();
        let worker = handle.spawn_blocking(move || run_import(worker_task, work_list, store));

        // A panicking store would otherwise leave the slot RUNNING forever.
        handle.spawn(async move {
            if let Err(e) = worker.await {
                error!(
                    task_id = %task.id(),
                    error = %e,
                    "Import worker aborted, marking task failed"
                );
                task.finish(ImportStatus::Failed);
            }
        });

        Ok(started)
    }

    /// See [`TaskRegistry::poll`]
    pub fn poll(&self, owner: &str) -> PollOutcome {
        self.registry.poll(owner)
    }

    /// See [`TaskRegistry::cancel`]
    pub fn cancel(&self, owner: &str) -> bool {
        self.registry.cancel(owner)
    }
}
