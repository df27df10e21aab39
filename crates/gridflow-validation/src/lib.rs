//! Gridflow validation - strict checking of untrusted request parameters
//!
//! Every parameter that reaches the workflow manager has first been matched
//! against a grammar in [`grammar`] by one of the rules in [`rules`]. The
//! per-method validators in [`workflow`] turn raw query/form parameters into
//! typed requests and reject anything they do not consume.

#![forbid(unsafe_code)]

pub mod error;
pub mod grammar;
pub mod params;
pub mod rules;
pub mod workflow;

pub use error::{ValidationError, ValidationResult};
pub use params::{RawParams, SafeParams, SafeValue};
pub use rules::{validate_num, validate_numlist, validate_str, validate_strlist, NumBounds};
pub use workflow::{
    validate_delete, validate_get, validate_post, validate_put, validate_request, AbortRequest,
    ModifyRequest, QueryRequest, WorkflowCall,
};
