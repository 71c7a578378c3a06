//! Health check endpoint for container orchestration.
//!
//! Liveness only: answers as long as the process can serve HTTP, without
//! touching the filesystem or the container daemon.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check handler. Always `{"status": "ok"}`.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
