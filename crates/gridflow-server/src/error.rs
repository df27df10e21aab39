//! Error types for the Gridflow Server
//!
//! This module contains the error types used throughout the server.

use thiserror::Error;

use gridflow_core::CoreError;
use gridflow_validation::ValidationError;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// A required parameter was not supplied
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// A parameter failed validation
    #[error("Invalid input parameter: {0}")]
    InvalidParameter(String),

    /// A referenced workflow does not exist
    #[error("Required object is missing: {0}")]
    MissingObject(String),

    /// A workflow with the same name exists
    #[error("An object with the same name already exists: {0}")]
    ObjectAlreadyExists(String),

    /// The workflow cannot undergo the operation in its current state
    #[error("Invalid object state: {0}")]
    InvalidState(String),

    /// The caller may not act on the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The caller identity could not be established
    #[error("Missing principal: {0}")]
    MissingPrincipal(String),

    /// No handler for the HTTP method
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// The workflow manager failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Application error code reported in the `X-REST-Status` header
    pub fn app_code(&self) -> u32 {
        match self {
            ServerError::UnsupportedMethod(_) => 202,
            ServerError::MissingParameter(_) => 301,
            ServerError::InvalidParameter(_) => 302,
            ServerError::MissingObject(_) => 303,
            ServerError::ObjectAlreadyExists(_) => 305,
            ServerError::InvalidState(_) => 306,
            ServerError::ConfigurationError(_) | ServerError::InternalError(_) => 400,
            ServerError::ExecutionError(_) => 403,
            ServerError::Forbidden(_) => 901,
            ServerError::MissingPrincipal(_) => 902,
        }
    }

    /// Whether the error was caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            ServerError::ExecutionError(_)
                | ServerError::ConfigurationError(_)
                | ServerError::InternalError(_)
        )
    }
}

// Implement conversions from other error types
impl From<ValidationError> for ServerError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingParameter(name) => ServerError::MissingParameter(name),
            ValidationError::UnsupportedMethod(method) => ServerError::UnsupportedMethod(method),
            other => ServerError::InvalidParameter(other.to_string()),
        }
    }
}

impl From<CoreError> for ServerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(_) => ServerError::MissingObject(err.to_string()),
            CoreError::AlreadyExists(_) => ServerError::ObjectAlreadyExists(err.to_string()),
            CoreError::InvalidState { .. } => ServerError::InvalidState(err.to_string()),
            CoreError::ExecutionError(msg) => ServerError::ExecutionError(msg),
            CoreError::Serialization(e) => ServerError::InternalError(format!("JSON error: {}", e)),
        }
    }
}

impl From<serde_yaml::Error> for ServerError {
    fn from(err: serde_yaml::Error) -> Self {
        ServerError::ConfigurationError(format!("YAML error: {}", err))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::InternalError(format!("IO error: {}", err))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::InternalError(format!("Error: {}", err))
    }
}
