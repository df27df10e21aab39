//! API module for the Gridflow Server
//!
//! This module contains the API routes and handlers for the Gridflow Server.

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

pub mod errors;
pub mod health;
pub mod identity;
pub mod workflow;

use crate::server::WorkflowServer;

/// Build the router for API endpoints
pub fn build_router(server: Arc<WorkflowServer>) -> Router {
    let workflow_path = server.config.workflow_path();
    let pool = server.config.thread_pool.max(1);

    let workflow_routes = Router::new()
        .route(
            &workflow_path,
            put(workflow::submit_handler)
                .post(workflow::modify_handler)
                .get(workflow::query_handler)
                .delete(workflow::abort_handler)
                .fallback(workflow::unsupported_method_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            server.clone(),
            identity::require_identity,
        ));

    Router::new()
        .merge(workflow_routes)
        // Health check
        .route("/health", get(health::health_check))
        .layer(GlobalConcurrencyLimitLayer::new(pool))
        .layer(TraceLayer::new_for_http())
        // Shared state
        .with_state(server)
}

// Re-export the response envelope and error type for easier imports
pub use errors::ApiError;
pub use workflow::rows;
