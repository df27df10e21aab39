//! In-memory implementation of WorkflowManager
//!
//! This implementation is primarily intended for testing and development purposes.
//! All data is lost when the instance is dropped.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::manager::WorkflowManager;
use crate::types::{SubmitRequest, UserIdentity, WorkflowStatus};

/// Default look-back window of `get_latests`, in days
pub const DEFAULT_LATEST_AGE_DAYS: i64 = 7;

/// A single job of a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job number within the workflow
    pub job_id: u32,
    /// Job state, e.g. "success", "failed", "running"
    pub state: String,
    /// Exit code, if the job finished
    pub exit_code: Option<i32>,
    /// Failure description
    pub error_message: Option<String>,
    /// Location of the archived log
    pub log_url: Option<String>,
    /// Location of the output file
    pub output_url: Option<String>,
}

#[derive(Debug, Clone)]
struct WorkflowRecord {
    owner: UserIdentity,
    request: SubmitRequest,
    status: WorkflowStatus,
    submitted_at: DateTime<Utc>,
    publication: Option<String>,
    jobs: Vec<JobRecord>,
}

/// In-memory implementation of WorkflowManager
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowManager {
    workflows: Arc<RwLock<HashMap<String, WorkflowRecord>>>,
}

impl InMemoryWorkflowManager {
    /// Create a new, empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a job to a workflow, replacing any job with the same id
    pub async fn record_job(&self, workflow: &str, job: JobRecord) -> CoreResult<()> {
        let mut store = self.workflows.write().await;
        let record = store
            .get_mut(workflow)
            .ok_or_else(|| CoreError::NotFound(workflow.to_string()))?;
        record.jobs.retain(|j| j.job_id != job.job_id);
        record.jobs.push(job);
        record.jobs.sort_by_key(|j| j.job_id);
        Ok(())
    }

    /// Override the submission time of a workflow, for importing history
    pub async fn set_submitted_at(&self, workflow: &str, at: DateTime<Utc>) -> CoreResult<()> {
        let mut store = self.workflows.write().await;
        let record = store
            .get_mut(workflow)
            .ok_or_else(|| CoreError::NotFound(workflow.to_string()))?;
        record.submitted_at = at;
        Ok(())
    }

    /// Current status of a workflow
    pub async fn workflow_status(&self, workflow: &str) -> CoreResult<WorkflowStatus> {
        let store = self.workflows.read().await;
        store
            .get(workflow)
            .map(|r| r.status)
            .ok_or_else(|| CoreError::NotFound(workflow.to_string()))
    }

    fn lookup<'a>(
        store: &'a HashMap<String, WorkflowRecord>,
        workflow: &str,
    ) -> CoreResult<&'a WorkflowRecord> {
        store
            .get(workflow)
            .ok_or_else(|| CoreError::NotFound(workflow.to_string()))
    }

    // Negative limits are treated like no limit at all.
    fn truncate(mut rows: Vec<Value>, limit: Option<i64>) -> Vec<Value> {
        if let Some(limit) = limit.filter(|l| *l >= 0) {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        rows
    }

    /// Oldest submission time still inside a window of `days`; windows
    /// reaching past the representable range cover everything.
    fn cutoff(days: i64) -> DateTime<Utc> {
        Duration::try_days(days)
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[async_trait]
impl WorkflowManager for InMemoryWorkflowManager {
    async fn submit(&self, request: SubmitRequest, user: &UserIdentity) -> CoreResult<Value> {
        let mut store = self.workflows.write().await;
        if store.contains_key(&request.workflow) {
            return Err(CoreError::AlreadyExists(request.workflow));
        }

        let name = request.workflow.clone();
        let submitted_at = Utc::now();
        info!(workflow = %name, user = %user.login, "Workflow accepted");
        store.insert(
            name.clone(),
            WorkflowRecord {
                owner: user.clone(),
                request,
                status: WorkflowStatus::New,
                submitted_at,
                publication: None,
                jobs: Vec::new(),
            },
        );

        Ok(json!({
            "RequestName": name,
            "status": WorkflowStatus::New,
            "submitted": submitted_at.to_rfc3339(),
        }))
    }

    async fn resubmit(&self, workflow: &str) -> CoreResult<Value> {
        let mut store = self.workflows.write().await;
        let record = store
            .get_mut(workflow)
            .ok_or_else(|| CoreError::NotFound(workflow.to_string()))?;

        if record.status == WorkflowStatus::Killed {
            return Err(CoreError::InvalidState {
                workflow: workflow.to_string(),
                status: record.status.to_string(),
                message: "killed workflows cannot be resubmitted".to_string(),
            });
        }

        let mut resubmitted = Vec::new();
        for job in record.jobs.iter_mut().filter(|j| j.state == "failed") {
            job.state = "pending".to_string();
            job.exit_code = None;
            job.error_message = None;
            resubmitted.push(job.job_id);
        }
        record.status = WorkflowStatus::Resubmitted;
        debug!(%workflow, jobs = resubmitted.len(), "Failed jobs resubmitted");

        Ok(json!({
            "workflow": workflow,
            "status": record.status,
            "resubmitted": resubmitted,
        }))
    }

    async fn publish(&self, workflow: &str, dbsurl: &str) -> CoreResult<Value> {
        let mut store = self.workflows.write().await;
        let record = store
            .get_mut(workflow)
            .ok_or_else(|| CoreError::NotFound(workflow.to_string()))?;

        if record.status == WorkflowStatus::Killed {
            return Err(CoreError::InvalidState {
                workflow: workflow.to_string(),
                status: record.status.to_string(),
                message: "killed workflows cannot be published".to_string(),
            });
        }

        record.publication = Some(dbsurl.to_string());
        record.status = WorkflowStatus::Publishing;

        Ok(json!({
            "workflow": workflow,
            "status": record.status,
            "publishname": record.request.publishname,
            "dbsurl": dbsurl,
        }))
    }

    async fn status(&self, workflows: &[String]) -> CoreResult<Vec<Value>> {
        let store = self.workflows.read().await;
        let mut rows = Vec::with_capacity(workflows.len());

        for name in workflows {
            let record = Self::lookup(&store, name)?;
            let mut per_state: BTreeMap<&str, u32> = BTreeMap::new();
            for job in &record.jobs {
                *per_state.entry(job.state.as_str()).or_default() += 1;
            }
            rows.push(json!({
                "workflow": name,
                "status": record.status,
                "submitted": record.submitted_at.to_rfc3339(),
                "jobsPerStatus": per_state,
                "publication": record.publication,
            }));
        }

        Ok(rows)
    }

    async fn logs(&self, workflows: &[String], limit: Option<i64>) -> CoreResult<Vec<Value>> {
        let store = self.workflows.read().await;
        let mut rows = Vec::new();
        for name in workflows {
            let record = Self::lookup(&store, name)?;
            rows.extend(record.jobs.iter().filter_map(|job| {
                job.log_url.as_ref().map(|url| {
                    json!({ "workflow": name, "jobid": job.job_id, "url": url })
                })
            }));
        }
        Ok(Self::truncate(rows, limit))
    }

    async fn output(&self, workflows: &[String], limit: Option<i64>) -> CoreResult<Vec<Value>> {
        let store = self.workflows.read().await;
        let mut rows = Vec::new();
        for name in workflows {
            let record = Self::lookup(&store, name)?;
            rows.extend(record.jobs.iter().filter_map(|job| {
                job.output_url.as_ref().map(|url| {
                    json!({ "workflow": name, "jobid": job.job_id, "url": url })
                })
            }));
        }
        Ok(Self::truncate(rows, limit))
    }

    async fn errors(&self, workflows: &[String], shortformat: Option<i64>) -> CoreResult<Vec<Value>> {
        let store = self.workflows.read().await;
        let short = shortformat.unwrap_or(0) != 0;
        let mut rows = Vec::new();

        for name in workflows {
            let record = Self::lookup(&store, name)?;
            let failed = record
                .jobs
                .iter()
                .filter(|j| matches!(j.exit_code, Some(code) if code != 0));

            if short {
                let mut per_code: BTreeMap<i32, u32> = BTreeMap::new();
                for job in failed {
                    if let Some(code) = job.exit_code {
                        *per_code.entry(code).or_default() += 1;
                    }
                }
                rows.extend(per_code.into_iter().map(|(code, count)| {
                    json!({ "workflow": name, "exitcode": code, "jobs": count })
                }));
            } else {
                rows.extend(failed.map(|job| {
                    json!({
                        "workflow": name,
                        "jobid": job.job_id,
                        "exitcode": job.exit_code,
                        "message": job.error_message,
                    })
                }));
            }
        }

        Ok(rows)
    }

    async fn report(&self, workflows: &[String]) -> CoreResult<Value> {
        let store = self.workflows.read().await;
        let mut report = Map::new();
        for name in workflows {
            let record = Self::lookup(&store, name)?;
            let finished = record.jobs.iter().filter(|j| j.exit_code == Some(0)).count();
            let failed = record
                .jobs
                .iter()
                .filter(|j| matches!(j.exit_code, Some(code) if code != 0))
                .count();
            report.insert(
                name.clone(),
                json!({
                    "jobs": record.jobs.len(),
                    "finished": finished,
                    "failed": failed,
                    "runwhitelist": record.request.runwhitelist.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
                }),
            );
        }
        Ok(Value::Object(report))
    }

    async fn schema(&self, workflows: &[String]) -> CoreResult<Value> {
        let store = self.workflows.read().await;
        let mut schema = Map::new();
        for name in workflows {
            let record = Self::lookup(&store, name)?;
            let mut document = serde_json::to_value(&record.request)?;
            if let Value::Object(fields) = &mut document {
                fields.insert("userdn".to_string(), json!(record.owner.dn));
                fields.insert("userhn".to_string(), json!(record.owner.login));
            }
            schema.insert(name.clone(), document);
        }
        Ok(Value::Object(schema))
    }

    async fn configcache(&self, workflows: &[String]) -> CoreResult<Value> {
        let store = self.workflows.read().await;
        let mut docs = Map::new();
        for name in workflows {
            let record = Self::lookup(&store, name)?;
            docs.insert(name.clone(), json!({ "configdoc": record.request.configdoc }));
        }
        Ok(Value::Object(docs))
    }

    async fn get_latests(&self, login: &str, limit: Option<i64>, age: Option<i64>) -> CoreResult<Vec<Value>> {
        let store = self.workflows.read().await;
        let since = Self::cutoff(age.unwrap_or(DEFAULT_LATEST_AGE_DAYS));

        let mut latest: Vec<(&String, &WorkflowRecord)> = store
            .iter()
            .filter(|(_, r)| r.owner.login == login && r.submitted_at >= since)
            .collect();
        latest.sort_by(|a, b| b.1.submitted_at.cmp(&a.1.submitted_at));

        let rows = latest
            .into_iter()
            .map(|(name, record)| {
                json!({
                    "workflow": name,
                    "status": record.status,
                    "submitted": record.submitted_at.to_rfc3339(),
                })
            })
            .collect();

        Ok(Self::truncate(rows, limit))
    }

    async fn kill(&self, workflows: &[String], force: Option<i64>) -> CoreResult<Value> {
        let force = force.unwrap_or(0) != 0;
        let mut store = self.workflows.write().await;

        // Check everything before touching anything so a refused kill leaves no partial state.
        for name in workflows {
            let record = Self::lookup(&store, name)?;
            if record.status == WorkflowStatus::Killed && !force {
                return Err(CoreError::InvalidState {
                    workflow: name.clone(),
                    status: record.status.to_string(),
                    message: "already killed, use force to kill again".to_string(),
                });
            }
        }

        for name in workflows {
            if let Some(record) = store.get_mut(name) {
                record.status = WorkflowStatus::Killed;
                for job in record.jobs.iter_mut().filter(|j| j.exit_code.is_none()) {
                    job.state = "killed".to_string();
                }
            }
        }

        info!(count = workflows.len(), force, "Workflows killed");
        Ok(json!({ "killed": workflows }))
    }

    async fn owners(&self, workflows: &[String]) -> CoreResult<HashMap<String, UserIdentity>> {
        let store = self.workflows.read().await;
        Ok(workflows
            .iter()
            .filter_map(|name| store.get(name).map(|r| (name.clone(), r.owner.clone())))
            .collect())
    }

    async fn health_check(&self) -> CoreResult<bool> {
        Ok(true)
    }
}
