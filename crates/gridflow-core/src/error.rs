//! Error types for the workflow manager

use thiserror::Error;

/// Errors reported by a workflow manager
#[derive(Error, Debug)]
pub enum CoreError {
    /// The named workflow does not exist
    #[error("Workflow '{0}' not found")]
    NotFound(String),

    /// A workflow with the same name was already submitted
    #[error("Workflow '{0}' already exists")]
    AlreadyExists(String),

    /// The operation is not allowed in the workflow's current state
    #[error("Workflow '{workflow}' is {status}: {message}")]
    InvalidState {
        /// Workflow name
        workflow: String,
        /// Current status
        status: String,
        /// What was refused
        message: String,
    },

    /// The manager failed while executing the operation
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// A result could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for workflow manager operations
pub type CoreResult<T> = Result<T, CoreError>;
