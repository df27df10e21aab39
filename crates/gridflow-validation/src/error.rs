//! Validation errors

use thiserror::Error;

/// Reasons a request is refused before reaching the workflow manager
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required parameter was not supplied
    #[error("Missing required parameter '{0}'")]
    MissingParameter(String),

    /// A parameter was supplied but does not satisfy its grammar
    #[error("Incorrect '{name}' parameter: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// Parameters that no rule consumed
    #[error("Excess arguments: {}", .0.join(", "))]
    ExcessArguments(Vec<String>),

    /// The request body or query string is not valid url-encoding
    #[error("Malformed parameters: {0}")]
    Malformed(String),

    /// No validator exists for the HTTP method
    #[error("Unsupported method {0}")]
    UnsupportedMethod(String),
}

impl ValidationError {
    /// Shorthand for [`ValidationError::InvalidParameter`]
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for validation
pub type ValidationResult<T> = Result<T, ValidationError>;
