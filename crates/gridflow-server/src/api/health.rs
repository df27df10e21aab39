//! Health check endpoint for the Gridflow Server

use axum::{
    extract::State,
    response::IntoResponse,
    Json,
    http::StatusCode,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::server::WorkflowServer;

/// Health check handler
///
/// Reports the server version, the service description and the state of the
/// workflow manager along with the databases it is configured against.
pub async fn health_check(
    State(server): State<Arc<WorkflowServer>>,
) -> impl IntoResponse {
    debug!("Health check requested");

    let manager_status = match server.check_manager_health().await {
        Ok(true) => "UP",
        Ok(false) => "DEGRADED",
        Err(err) => {
            warn!(?err, "Workflow manager health check failed");
            "DOWN"
        }
    };

    let status_code = if manager_status == "DOWN" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    let config = &server.config;
    let response = json!({
        "status": if manager_status == "DOWN" { "DOWN" } else { "UP" },
        "version": env!("CARGO_PKG_VERSION"),
        "application": config.application,
        "title": config.title,
        "description": config.description,
        "admin": config.admin,
        "dependencies": {
            "workflowManager": { "status": manager_status },
            "monitoring": { "url": config.monitoring_url, "database": config.monitoring_name },
            "configCache": { "url": config.configcache_url, "database": config.configcache_name },
            "requestManager": { "url": config.reqmgr_url, "database": config.reqmgr_name },
        },
    });

    (status_code, Json(response))
}
