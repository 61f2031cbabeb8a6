//! Owner-scoped import task registry
//!
//! Each owner has at most one slot. A slot holding a running task cannot be
//! replaced; a slot holding a terminal task is consumed by the first poll that
//! observes the terminal status. Both checks happen under the registry lock,
//! and the registry lock is always taken before a task's progress lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{ImportTask, TaskSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("An import is already running for '{owner}' (task {task_id})")]
    AlreadyRunning { owner: String, task_id: Uuid },
}

/// Result of polling an owner's slot
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Nothing registered for the owner
    NoImport,
    /// Current progress; when terminal, the slot has been released
    Task(TaskSnapshot),
}

#[derive(Debug, Default)]
pub struct TaskRegistry {
    slots: Mutex<HashMap<String, Arc<ImportTask>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Slots are inserted and removed whole, so the map is valid after a panic.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<ImportTask>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `task` under its owner unless a running task is present
    ///
    /// A terminal task that was never polled is replaced.
    pub fn register(&self, task: Arc<ImportTask>) -> Result<(), RegisterError> {
        let mut slots = self.lock();
        if let Some(existing) = slots.get(task.owner()) {
            if !existing.is_terminal() {
                return Err(RegisterError::AlreadyRunning {
                    owner: task.owner().to_string(),
                    task_id: existing.id(),
                });
            }
            debug!(
                owner = %task.owner(),
                task_id = %existing.id(),
                "Replacing unpolled finished import"
            );
        }
        slots.insert(task.owner().to_string(), task);
        Ok(())
    }

    /// Snapshot the owner's task, releasing the slot if it has ended
    pub fn poll(&self, owner: &str) -> PollOutcome {
        let mut slots = self.lock();
        let Some(task) = slots.get(owner) else {
            return PollOutcome::NoImport;
        };

        let snapshot = task.snapshot();
        if snapshot.status.is_terminal() {
            slots.remove(owner);
            info!(
                owner = %owner,
                task_id = %snapshot.task_id,
                status = ?snapshot.status,
                processed = snapshot.processed_count,
                total = snapshot.total_count,
                "Import result delivered, task released"
            );
        }
        PollOutcome::Task(snapshot)
    }

    /// Ask the owner's task to stop; returns whether a task was registered
    pub fn cancel(&self, owner: &str) -> bool {
        let slots = self.lock();
        match slots.get(owner) {
            Some(task) => {
                task.request_cancel();
                info!(owner = %owner, task_id = %task.id(), "Import cancellation requested");
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    fn get(&self, owner: &str) -> Option<Arc<ImportTask>> {
        self.lock().get(owner).cloned()
    }

    /// Number of occupied slots
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImportStatus;

    #[test]
    fn test_poll_without_task() {
        let registry = TaskRegistry::new();
        assert_eq!(registry.poll("admin"), PollOutcome::NoImport);
    }

    #[test]
    fn test_running_task_blocks_second_register() {
        let registry = TaskRegistry::new();
        let first = Arc::new(ImportTask::new("admin", 1));
        registry.register(first.clone()).unwrap();

        let err = registry
            .register(Arc::new(ImportTask::new("admin", 5)))
            .unwrap_err();
        assert_eq!(
            err,
            RegisterError::AlreadyRunning {
                owner: "admin".to_string(),
                task_id: first.id(),
            }
        );
        assert_eq!(registry.get("admin").unwrap().id(), first.id());
    }

    #[test]
    fn test_owners_are_independent() {
        let registry = TaskRegistry::new();
        registry.register(Arc::new(ImportTask::new("alice", 1))).unwrap();
        registry.register(Arc::new(ImportTask::new("bob", 1))).unwrap();
        assert_eq!(registry.active_count(), 2);
    }

    #[test]
    fn test_running_poll_keeps_slot() {
        let registry = TaskRegistry::new();
        registry.register(Arc::new(ImportTask::new("admin", 2))).unwrap();

        for _ in 0..3 {
            match registry.poll("admin") {
                PollOutcome::Task(snapshot) => assert_eq!(snapshot.status, ImportStatus::Running),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn test_terminal_poll_consumes_slot() {
        let registry = TaskRegistry::new();
        let task = Arc::new(ImportTask::new("admin", 0));
        registry.register(task.clone()).unwrap();
        task.finish(ImportStatus::Completed);

        match registry.poll("admin") {
            PollOutcome::Task(snapshot) => assert_eq!(snapshot.status, ImportStatus::Completed),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(registry.poll("admin"), PollOutcome::NoImport);
    }

    #[test]
    fn test_unpolled_terminal_task_is_replaced() {
        let registry = TaskRegistry::new();
        let old = Arc::new(ImportTask::new("admin", 0));
        registry.register(old.clone()).unwrap();
        old.finish(ImportStatus::Failed);

        let new = Arc::new(ImportTask::new("admin", 1));
        registry.register(new.clone()).unwrap();
        assert_eq!(registry.get("admin").unwrap().id(), new.id());
    }

    #[test]
    fn test_cancel_sets_flag_only() {
        let registry = TaskRegistry::new();
        assert!(!registry.cancel("admin"));

        let task = Arc::new(ImportTask::new("admin", 1));
        registry.register(task.clone()).unwrap();
        assert!(registry.cancel("admin"));
        assert!(task.is_cancel_requested());
        assert_eq!(task.status(), ImportStatus::Running);
    }
}
