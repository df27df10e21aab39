//! Workflow manager interface
//!
//! The manager owns the workflow lifecycle: splitting into jobs, site
//! selection, status aggregation and log/output bookkeeping. The REST layer
//! only talks to it through this trait.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::error::CoreResult;
use crate::types::{SubmitRequest, UserIdentity};

/// Operations offered by a workflow manager
///
/// Operations returning `Vec<Value>` produce one row per entry; the others
/// produce a single row.
#[async_trait]
pub trait WorkflowManager: Send + Sync + Debug {
    /// Insert a new workflow on behalf of `user`
    async fn submit(&self, request: SubmitRequest, user: &UserIdentity) -> CoreResult<Value>;

    /// Send the failed jobs of a workflow back for processing
    async fn resubmit(&self, workflow: &str) -> CoreResult<Value>;

    /// Publish the workflow output to the given DBS instance
    async fn publish(&self, workflow: &str, dbsurl: &str) -> CoreResult<Value>;

    /// Status summary of each workflow
    async fn status(&self, workflows: &[String]) -> CoreResult<Vec<Value>>;

    /// Log file locations, at most `limit` entries
    async fn logs(&self, workflows: &[String], limit: Option<i64>) -> CoreResult<Vec<Value>>;

    /// Output file locations, at most `limit` entries
    async fn output(&self, workflows: &[String], limit: Option<i64>) -> CoreResult<Vec<Value>>;

    /// Job failures; a non-zero `shortformat` returns counts per exit code
    async fn errors(&self, workflows: &[String], shortformat: Option<i64>) -> CoreResult<Vec<Value>>;

    /// Processing report
    async fn report(&self, workflows: &[String]) -> CoreResult<Value>;

    /// Submitted request documents
    async fn schema(&self, workflows: &[String]) -> CoreResult<Value>;

    /// Configuration cache references
    async fn configcache(&self, workflows: &[String]) -> CoreResult<Value>;

    /// The user's workflows submitted in the last `age` days, at most `limit`
    async fn get_latests(&self, login: &str, limit: Option<i64>, age: Option<i64>) -> CoreResult<Vec<Value>>;

    /// Abort workflows
    async fn kill(&self, workflows: &[String], force: Option<i64>) -> CoreResult<Value>;

    /// Owners of the named workflows; unknown names are absent from the map
    async fn owners(&self, workflows: &[String]) -> CoreResult<HashMap<String, UserIdentity>>;

    /// Get health status
    async fn health_check(&self) -> CoreResult<bool>;
}
