//! HTTP control server
//!
//! Lets a remote caller start one crawl at a time, poll its progress, and
//! delete project output directories.

mod handlers;
mod state;

pub use handlers::{ErrorResponse, HealthResponse, MessageResponse, StatusResponse};
pub use state::ControlState;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::LumiError;

pub fn create_router(state: Arc<ControlState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/launch", post(handlers::launch))
        .route("/status", get(handlers::status))
        .route("/projects/{project}", delete(handlers::delete_project))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the control API until the process is interrupted
pub async fn serve(state: Arc<ControlState>, addr: SocketAddr) -> Result<(), LumiError> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Control server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Control server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
