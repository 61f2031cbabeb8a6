//! Import task record
//!
//! State machine: RUNNING → COMPLETED | CANCELLED | FAILED.
//! Terminal states are final; [`ImportTask::finish`] ignores any later
//! transition attempt.
//!
//! The record is shared between the worker (sole writer of progress) and the
//! request handlers (readers via [`ImportTask::snapshot`], plus the cancel
//! flag). All progress fields live behind one mutex so a snapshot is never
//! torn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::category::Category;

/// Import task state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportStatus {
    /// Work list being applied
    Running,
    /// Every item processed
    Completed,
    /// Stopped on request; remaining items not applied
    Cancelled,
    /// Stopped on a fatal apply error; remaining items abandoned
    Failed,
}

impl ImportStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ImportStatus::Running)
    }
}

/// Severity of a recorded item outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Item rejected, import continued
    Validation,
    /// Item failed and the import stopped
    Fatal,
}

/// One recorded item outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportMessage {
    pub category: String,
    pub index: usize,
    pub kind: MessageKind,
    pub message: String,
}

impl ImportMessage {
    pub fn validation(category: &Category, index: usize, message: impl Into<String>) -> Self {
        Self {
            category: category.name.to_string(),
            index,
            kind: MessageKind::Validation,
            message: message.into(),
        }
    }

    pub fn fatal(category: &Category, index: usize, message: impl Into<String>) -> Self {
        Self {
            category: category.name.to_string(),
            index,
            kind: MessageKind::Fatal,
            message: message.into(),
        }
    }
}

/// Mutable progress, written only by the task's worker
#[derive(Debug, Clone)]
struct TaskProgress {
    status: ImportStatus,
    /// Index of the next work item
    cursor: usize,
    processed: usize,
    messages: Vec<ImportMessage>,
    ended_at: Option<DateTime<Utc>>,
}

/// Consistent copy of a task's progress
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub task_id: Uuid,
    pub status: ImportStatus,
    pub processed_count: usize,
    pub total_count: usize,
    pub messages: Vec<ImportMessage>,
}

/// Shared import task record
#[derive(Debug)]
pub struct ImportTask {
    id: Uuid,
    owner: String,
    total: usize,
    started_at: DateTime<Utc>,
    cancel: CancellationToken,
    progress: Mutex<TaskProgress>,
}

impl ImportTask {
    /// Create a running task for a work list of `total` items
    pub fn new(owner: impl Into<String>, total: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            total,
            started_at: Utc::now(),
            cancel: CancellationToken::new(),
            progress: Mutex::new(TaskProgress {
                status: ImportStatus::Running,
                cursor: 0,
                processed: 0,
                messages: Vec::new(),
                ended_at: None,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Request cancellation; the worker stops before its next item
    pub fn request_cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // Every critical section leaves TaskProgress consistent, so a poisoned
    // lock still holds valid data.
    fn lock(&self) -> MutexGuard<'_, TaskProgress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> ImportStatus {
        self.lock().status
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Index of the next item to process
    pub fn cursor(&self) -> usize {
        self.lock().cursor
    }

    /// Record a successfully applied item
    pub fn record_applied(&self) {
        let mut progress = self.lock();
        if progress.status.is_terminal() || progress.cursor >= self.total {
            return;
        }
        progress.cursor += 1;
        progress.processed += 1;
    }

    /// Record a rejected item; processing continues with the next one
    pub fn record_rejected(&self, message: ImportMessage) {
        let mut progress = self.lock();
        if progress.status.is_terminal() || progress.cursor >= self.total {
            return;
        }
        progress.messages.push(message);
        progress.cursor += 1;
        progress.processed += 1;
    }

    /// Record a fatal item outcome and fail the task
    pub fn record_fatal(&self, message: ImportMessage) {
        let mut progress = self.lock();
        if progress.status.is_terminal() {
            return;
        }
        progress.messages.push(message);
        progress.status = ImportStatus::Failed;
        progress.ended_at = Some(Utc::now());
    }

    /// Move to a terminal state
    ///
    /// Returns false, leaving the task untouched, if it already ended or if
    /// `status` is not terminal.
    pub fn finish(&self, status: ImportStatus) -> bool {
        let mut progress = self.lock();
        if progress.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        progress.status = status;
        progress.ended_at = Some(Utc::now());
        true
    }

    /// Copy the current progress under the task lock
    pub fn snapshot(&self) -> TaskSnapshot {
        let progress = self.lock();
        TaskSnapshot {
            task_id: self.id,
            status: progress.status,
            processed_count: progress.processed,
            total_count: self.total,
            messages: progress.messages.clone(),
        }
    }

    /// Time spent so far, or in total once ended
    pub fn elapsed(&self) -> chrono::Duration {
        let ended_at = self.lock().ended_at;
        ended_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category;

    fn users() -> &'static Category {
        category::lookup("users").unwrap()
    }

    #[test]
    fn test_new_task_is_running() {
        let task = ImportTask::new("admin", 3);
        let snapshot = task.snapshot();
        assert_eq!(snapshot.status, ImportStatus::Running);
        assert_eq!(snapshot.processed_count, 0);
        assert_eq!(snapshot.total_count, 3);
        assert!(snapshot.messages.is_empty());
    }

    #[test]
    fn test_rejected_item_still_counts_as_processed() {
        let task = ImportTask::new("admin", 2);
        task.record_applied();
        task.record_rejected(ImportMessage::validation(users(), 1, "duplicate"));

        let snapshot = task.snapshot();
        assert_eq!(snapshot.processed_count, 2);
        assert_eq!(task.cursor(), 2);
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.messages[0].kind, MessageKind::Validation);
        assert_eq!(snapshot.messages[0].index, 1);
    }

    #[test]
    fn test_processed_never_exceeds_total() {
        let task = ImportTask::new("admin", 1);
        task.record_applied();
        task.record_applied();
        assert_eq!(task.snapshot().processed_count, 1);
    }

    #[test]
    fn test_fatal_fails_without_counting() {
        let task = ImportTask::new("admin", 2);
        task.record_fatal(ImportMessage::fatal(users(), 0, "store offline"));

        let snapshot = task.snapshot();
        assert_eq!(snapshot.status, ImportStatus::Failed);
        assert_eq!(snapshot.processed_count, 0);
        assert_eq!(snapshot.messages[0].kind, MessageKind::Fatal);
    }

    #[test]
    fn test_terminal_state_is_final() {
        let task = ImportTask::new("admin", 1);
        assert!(task.finish(ImportStatus::Cancelled));
        assert!(!task.finish(ImportStatus::Completed));
        task.record_fatal(ImportMessage::fatal(users(), 0, "late"));
        task.record_applied();

        let snapshot = task.snapshot();
        assert_eq!(snapshot.status, ImportStatus::Cancelled);
        assert_eq!(snapshot.processed_count, 0);
        assert!(snapshot.messages.is_empty());
    }

    #[test]
    fn test_finish_rejects_running() {
        let task = ImportTask::new("admin", 0);
        assert!(!task.finish(ImportStatus::Running));
        assert_eq!(task.status(), ImportStatus::Running);
    }

    #[test]
    fn test_cancel_flag_is_monotonic() {
        let task = ImportTask::new("admin", 0);
        assert!(!task.is_cancel_requested());
        task.request_cancel();
        task.request_cancel();
        assert!(task.is_cancel_requested());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&ImportStatus::Completed).unwrap(),
            "\"COMPLETED\""
        );
    }
}
