//! Error types for local store operations.

use thiserror::Error;
use vibe_tasks_core::id::TaskId;

/// Errors that can occur during `LocalStore` operations.
#[derive(Error, Debug)]
pub enum LocalStoreError {
    /// Task was not found in the store.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// The presented credential does not match the required one.
    #[error("Missing or invalid credential")]
    Unauthorized,

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to read or write the JSON data file.
    #[error("Failed to encode tasks: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Background persistence task did not complete.
    #[error("Persistence task failed: {0}")]
    JoinError(String),
}
