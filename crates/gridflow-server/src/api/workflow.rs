//! Workflow resource handlers
//!
//! Parameters are read from the query string and, for any method, from an
//! url-encoded body. Successful calls return `{"result": [rows...]}`.

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::Method,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use gridflow_validation::RawParams;

use crate::api::errors::ApiError;
use crate::api::identity::Caller;
use crate::error::ServerError;
use crate::server::WorkflowServer;

/// Wrap result rows in the response envelope
pub fn rows(values: Vec<Value>) -> Json<Value> {
    Json(json!({ "result": values }))
}

fn params(query: Option<String>, body: &Bytes) -> Result<RawParams, ApiError> {
    RawParams::from_urlencoded(query.as_deref(), body).map_err(|e| ApiError(e.into()))
}

/// PUT: insert a new workflow
pub async fn submit_handler(
    State(server): State<Arc<WorkflowServer>>,
    Caller(caller): Caller,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let raw = params(query, &body)?;
    Ok(rows(server.submit_workflow(raw, &caller).await?))
}

/// POST: resubmit or publish an existing workflow
pub async fn modify_handler(
    State(server): State<Arc<WorkflowServer>>,
    Caller(caller): Caller,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let raw = params(query, &body)?;
    Ok(rows(server.modify_workflow(raw, &caller).await?))
}

/// GET: workflow status, a subresource, or the caller's latest workflows
pub async fn query_handler(
    State(server): State<Arc<WorkflowServer>>,
    Caller(caller): Caller,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let raw = params(query, &body)?;
    Ok(rows(server.query_workflows(raw, &caller).await?))
}

/// DELETE: abort workflows
pub async fn abort_handler(
    State(server): State<Arc<WorkflowServer>>,
    Caller(caller): Caller,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let raw = params(query, &body)?;
    Ok(rows(server.abort_workflows(raw, &caller).await?))
}

/// Any other method
pub async fn unsupported_method_handler(method: Method) -> impl IntoResponse {
    ApiError(ServerError::UnsupportedMethod(method.to_string()))
}
