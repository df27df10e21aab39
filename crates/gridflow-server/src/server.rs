//! Main Gridflow Server implementation
//!
//! This module contains the WorkflowServer implementation: every call on the
//! workflow resource is validated, authorized and then delegated to the
//! workflow manager.

use std::net::SocketAddr;
use std::sync::Arc;
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{debug, info, info_span, Instrument};

use gridflow_core::{Subresource, UserIdentity, WorkflowManager};
use gridflow_validation::{
    validate_delete, validate_get, validate_post, validate_put, RawParams,
};

use crate::authz::authz_owner_match;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Main server implementation
#[derive(Clone)]
pub struct WorkflowServer {
    /// Configuration
    pub config: ServerConfig,

    /// Workflow manager all operations are delegated to
    manager: Arc<dyn WorkflowManager>,
}

impl std::fmt::Debug for WorkflowServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowServer")
            .field("config", &self.config)
            .field("manager", &self.manager)
            .finish()
    }
}

impl WorkflowServer {
    /// Create a new WorkflowServer
    pub fn new(config: ServerConfig, manager: Arc<dyn WorkflowManager>) -> Self {
        Self { config, manager }
    }

    /// The workflow manager
    pub fn manager(&self) -> &Arc<dyn WorkflowManager> {
        &self.manager
    }

    /// Run the server until ctrl-c
    pub async fn run(self) -> ServerResult<()> {
        info!("Starting Gridflow Server");

        let addr: SocketAddr = format!("{}:{}", self.config.bind_address, self.config.port)
            .parse()
            .map_err(|e| ServerError::ConfigurationError(format!("Invalid bind address: {}", e)))?;

        let app = crate::api::build_router(Arc::new(self));

        let listener = TcpListener::bind(addr).await?;
        info!("Listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }

    /// PUT: submit a new workflow on behalf of `caller`
    pub async fn submit_workflow(&self, raw: RawParams, caller: &UserIdentity) -> ServerResult<Vec<Value>> {
        let request = validate_put(raw)?;
        let span = info_span!("submit_workflow", workflow = %request.workflow, user = %caller.login);

        async move {
            info!("Submitting workflow");
            let result = self.manager.submit(request, caller).await?;
            Ok(vec![result])
        }
        .instrument(span)
        .await
    }

    /// POST: resubmit or publish an existing workflow
    ///
    /// Resubmission takes precedence when both are requested; with neither
    /// the call is a no-op.
    pub async fn modify_workflow(&self, raw: RawParams, caller: &UserIdentity) -> ServerResult<Vec<Value>> {
        let request = validate_post(raw)?;
        let span = info_span!("modify_workflow", workflow = %request.workflow, user = %caller.login);

        async move {
            let workflows = std::slice::from_ref(&request.workflow);

            if request.wants_resubmit() {
                authz_owner_match(self.manager.as_ref(), workflows, caller).await?;
                info!("Resubmitting workflow");
                let result = self.manager.resubmit(&request.workflow).await?;
                Ok(vec![result])
            } else if let Some(dbsurl) = &request.dbsurl {
                authz_owner_match(self.manager.as_ref(), workflows, caller).await?;
                info!(%dbsurl, "Publishing workflow");
                let result = self.manager.publish(&request.workflow, dbsurl).await?;
                Ok(vec![result])
            } else {
                debug!("Nothing to modify");
                Ok(Vec::new())
            }
        }
        .instrument(span)
        .await
    }

    /// GET: workflow status or one of its subresources, or the caller's latest workflows
    pub async fn query_workflows(&self, raw: RawParams, caller: &UserIdentity) -> ServerResult<Vec<Value>> {
        let request = validate_get(raw)?;
        let span = info_span!(
            "query_workflows",
            workflows = ?request.workflows,
            subresource = ?request.subresource,
            user = %caller.login
        );

        async move {
            let manager = &self.manager;

            if request.workflows.is_empty() {
                info!("Found user '{}'", caller.login);
                return Ok(manager
                    .get_latests(&caller.login, request.limit, request.age)
                    .await?);
            }

            let workflows = &request.workflows;
            debug!("Querying workflows");

            let rows = match request.subresource {
                None => manager.status(workflows).await?,
                Some(Subresource::Logs) => manager.logs(workflows, request.limit).await?,
                Some(Subresource::Data) => manager.output(workflows, request.limit).await?,
                Some(Subresource::Errors) => manager.errors(workflows, request.shortformat).await?,
                Some(Subresource::Report) => vec![manager.report(workflows).await?],
                Some(Subresource::Schema) => vec![manager.schema(workflows).await?],
                Some(Subresource::Configcache) => vec![manager.configcache(workflows).await?],
            };

            Ok(rows)
        }
        .instrument(span)
        .await
    }

    /// DELETE: abort workflows owned by `caller`
    pub async fn abort_workflows(&self, raw: RawParams, caller: &UserIdentity) -> ServerResult<Vec<Value>> {
        let request = validate_delete(raw)?;
        if request.workflows.is_empty() {
            return Err(ServerError::MissingParameter("workflow".to_string()));
        }

        let span = info_span!("abort_workflows", workflows = ?request.workflows, user = %caller.login);

        async move {
            authz_owner_match(self.manager.as_ref(), &request.workflows, caller).await?;
            info!(force = ?request.force, "Killing workflows");
            let result = self.manager.kill(&request.workflows, request.force).await?;
            Ok(vec![result])
        }
        .instrument(span)
        .await
    }

    /// Check workflow manager health
    pub async fn check_manager_health(&self) -> ServerResult<bool> {
        Ok(self.manager.health_check().await?)
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
