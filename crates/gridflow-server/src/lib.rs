//!
//! Gridflow Server - REST interface to the workflow manager
//!
//! This module exports all the components of the Gridflow Server.

// External dependencies
use std::sync::Arc;

use gridflow_core::{InMemoryWorkflowManager, WorkflowManager};

/// API module
pub mod api;

/// Ownership checks
pub mod authz;

/// Configuration module
pub mod config;

/// Error module
pub mod error;

/// Server module
pub mod server;

// Re-export key types
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::WorkflowServer;

/// Run function
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    // Initialize logging
    init_logging(&config);

    let manager = create_workflow_manager(&config)?;
    let server = WorkflowServer::new(config, manager);

    server.run().await
}

/// Initialize logging
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once is harmless.
pub fn init_logging(config: &ServerConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    // Create filter based on config
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let result = if std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false) {
        fmt().json().with_env_filter(filter).with_target(true).try_init()
    } else {
        fmt().with_env_filter(filter).with_target(true).try_init()
    };

    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
}

/// Create the workflow manager selected by `manager_url`
pub fn create_workflow_manager(config: &ServerConfig) -> ServerResult<Arc<dyn WorkflowManager>> {
    if config.manager_url.starts_with("memory://") {
        // Use in-memory workflow manager for development and testing
        tracing::info!("Using in-memory workflow manager");
        return Ok(Arc::new(InMemoryWorkflowManager::new()));
    }

    Err(ServerError::ConfigurationError(format!(
        "Unsupported workflow manager URL: {}", config.manager_url
    )))
}
