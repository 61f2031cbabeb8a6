//! Import task worker
//!
//! Applies a work list strictly in order, one item at a time. Cancellation is
//! checked before every item, so a cancel takes effect after at most one more
//! apply call. Nothing already applied is rolled back.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::{ImportMessage, ImportStatus, ImportTask, ValueKind, WorkItem};
use crate::store::{ApplyResult, CategoryStore};

/// Checks every item must pass before it reaches the store
///
/// Remembers keys applied earlier in the same import, so a document that
/// names the same entity twice has its second occurrence rejected. A first
/// occurrence the store refused is not remembered and does not block a later
/// valid one.
#[derive(Debug, Default)]
struct ItemValidator {
    applied: HashSet<(&'static str, String)>,
}

impl ItemValidator {
    fn check(&self, item: &WorkItem) -> Result<(), String> {
        let category = item.category;
        if !item.entity.is_object() {
            return Err(format!(
                "entity is not an object (found {})",
                ValueKind::of(&item.entity)
            ));
        }
        let Some(key) = category.key_of(&item.entity) else {
            return Err(format!("missing required field '{}'", category.key_field));
        };
        if self.applied.contains(&(category.name, key.to_string())) {
            return Err(format!("duplicate {} '{}'", category.key_field, key));
        }
        Ok(())
    }

    fn mark_applied(&mut self, item: &WorkItem) {
        if let Some(key) = item.category.key_of(&item.entity) {
            self.applied.insert((item.category.name, key.to_string()));
        }
    }
}

/// Run the task to a terminal state and return it
pub fn run_import(
    task: Arc<ImportTask>,
    work_list: Vec<WorkItem>,
    store: Arc<dyn CategoryStore>,
) -> ImportStatus {
    info!(
        task_id = %task.id(),
        owner = %task.owner(),
        total = work_list.len(),
        "Import worker started"
    );

    let mut validator = ItemValidator::default();
    let mut items = work_list.iter();

    let status = loop {
        if task.is_cancel_requested() {
            break ImportStatus::Cancelled;
        }
        let Some(item) = items.next() else {
            break ImportStatus::Completed;
        };

        if let Err(reason) = validator.check(item) {
            debug!(
                task_id = %task.id(),
                category = %item.category,
                index = item.index,
                reason = %reason,
                "Import item rejected before apply"
            );
            task.record_rejected(ImportMessage::validation(item.category, item.index, reason));
            continue;
        }

        match store.apply(item.category, &item.entity) {
            ApplyResult::Applied => {
                validator.mark_applied(item);
                task.record_applied();
            }
            ApplyResult::ValidationFailed(reason) => {
                debug!(
                    task_id = %task.id(),
                    category = %item.category,
                    index = item.index,
                    reason = %reason,
                    "Import item rejected by store"
                );
                task.record_rejected(ImportMessage::validation(item.category, item.index, reason));
            }
            ApplyResult::FatalError(reason) => {
                warn!(
                    task_id = %task.id(),
                    category = %item.category,
                    index = item.index,
                    reason = %reason,
                    "Fatal error applying import item, abandoning remaining items"
                );
                task.record_fatal(ImportMessage::fatal(item.category, item.index, reason));
                break ImportStatus::Failed;
            }
        }
    };

    if status != ImportStatus::Failed {
        task.finish(status);
    }

    let snapshot = task.snapshot();
    info!(
        task_id = %task.id(),
        status = ?snapshot.status,
        processed = snapshot.processed_count,
        total = snapshot.total_count,
        messages = snapshot.messages.len(),
        elapsed_ms = task.elapsed().num_milliseconds(),
        "Import worker finished"
    );
    snapshot.status
}
