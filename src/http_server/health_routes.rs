//! Health HTTP Routes
//!
//! Liveness banner at `/` and a health check that probes the database.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use super::state::ApiState;
use crate::store::{check_connection, ConnectionState};

/// Plain-text liveness banner
pub const BANNER: &str = "BARKR API";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: ConnectionState,
}

/// Create health routes
pub fn health_routes(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn root_handler() -> &'static str {
    BANNER
}

/// Health check handler; 503 while the database is unreachable
async fn health_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let database = check_connection(state.repository.store()).await;
    let (status, label) = if database.is_connected() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let response = HealthResponse {
        status: label.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
    };

    (status, Json(response))
}
