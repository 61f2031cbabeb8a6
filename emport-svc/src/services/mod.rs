//! Emport services
//!
//! - `export`: selected categories → document text
//! - `coordinator`: import start (parse, register, spawn)
//! - `worker`: ordered per-item apply loop
//! - `registry`: owner-scoped task slots, poll and cancel

pub mod coordinator;
pub mod export;
pub mod registry;
pub mod worker;

pub use coordinator::{ImportCoordinator, ImportStarted, StartImportError};
pub use export::{export, ExportError};
pub use registry::{PollOutcome, RegisterError, TaskRegistry};
pub use worker::run_import;
