//! Category store whose apply calls wait for permission
//!
//! Every `apply` first announces itself on the `entered` channel, then blocks
//! until the test sends a permit. Dropping the permit sender releases all
//! pending and future calls.

use emport_svc::models::Category;
use emport_svc::store::{ApplyResult, CategoryStore, MemoryStore, StoreError};
use serde_json::Value;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::time::Duration;

pub struct GatedStore {
    inner: MemoryStore,
    permits: Mutex<Receiver<()>>,
    entered: Mutex<Sender<()>>,
}

pub struct Gate {
    permits: Option<Sender<()>>,
    entered: Receiver<()>,
}

impl GatedStore {
    pub fn new() -> (Self, Gate) {
        let (permit_tx, permit_rx) = mpsc::channel();
        let (entered_tx, entered_rx) = mpsc::channel();
        (
            Self {
                inner: MemoryStore::new(),
                permits: Mutex::new(permit_rx),
                entered: Mutex::new(entered_tx),
            },
            Gate {
                permits: Some(permit_tx),
                entered: entered_rx,
            },
        )
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

impl Gate {
    /// Wait until the worker is inside an apply call
    pub fn wait_entered(&self) {
        self.entered
            .recv_timeout(Duration::from_secs(5))
            .expect("worker never reached apply");
    }

    /// Let one pending apply call finish
    pub fn release_one(&self) {
        if let Some(permits) = &self.permits {
            permits.send(()).expect("store dropped");
        }
    }

    /// Let every current and future apply call through
    pub fn open(&mut self) {
        self.permits = None;
    }
}

impl CategoryStore for GatedStore {
    fn list(&self, category: &Category) -> Result<Vec<Value>, StoreError> {
        self.inner.list(category)
    }

    fn apply(&self, category: &Category, entity: &Value) -> ApplyResult {
        let _ = self.entered.lock().unwrap().send(());
        // Err means the gate was opened for good
        let _ = self.permits.lock().unwrap().recv();
        self.inner.apply(category, entity)
    }
}
