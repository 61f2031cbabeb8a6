//! Data models for emport-svc
//!
//! - Category rank table
//! - Import document and work list
//! - Import task state machine

pub mod category;
pub mod document;
pub mod import_task;

pub use category::{Category, Reference};
pub use document::{DocumentError, ImportDocument, ValueKind, WorkItem};
pub use import_task::{ImportMessage, ImportStatus, ImportTask, MessageKind, TaskSnapshot};
