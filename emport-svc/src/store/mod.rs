//! Category persistence seam
//!
//! The import engine treats persistence as an opaque per-category `apply`
//! operation, and the export serializer as an opaque `list`. Implementations
//! may block; they are always called from a blocking-pool worker or from a
//! synchronous export request.

pub mod memory;

pub use memory::MemoryStore;

use serde_json::Value;
use thiserror::Error;

use crate::models::Category;

/// Outcome of applying one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    /// Entity stored (created or updated)
    Applied,
    /// Entity rejected; the import continues with the next item
    ValidationFailed(String),
    /// Store unusable; the import must stop
    FatalError(String),
}

/// Failure reading a category's entities
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Category '{category}' could not be read: {reason}")]
    Read { category: String, reason: String },
}

/// Per-category persistence operations
pub trait CategoryStore: Send + Sync {
    /// All entities of `category`, in their stored order
    fn list(&self, category: &Category) -> Result<Vec<Value>, StoreError>;

    /// Create or update one entity of `category`
    fn apply(&self, category: &Category, entity: &Value) -> ApplyResult;
}
