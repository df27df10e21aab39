//!
//! Gridflow Core - domain model for the workflow REST service
//!
//! This crate defines the request types, the caller identity and the
//! interface to the workflow manager that performs the actual job
//! management. The HTTP layer only validates, authorizes and delegates;
//! everything it delegates to goes through [`WorkflowManager`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Error types
pub mod error;

/// Core request and identity types
pub mod types;

/// Workflow manager interface
pub mod manager;

/// In-memory workflow manager
pub mod memory;

// Re-export key types
pub use error::{CoreError, CoreResult};
pub use manager::WorkflowManager;
pub use memory::{InMemoryWorkflowManager, JobRecord};
pub use types::{RunRange, SplitAlgorithm, SubmitRequest, Subresource, UserIdentity, WorkflowStatus};
