//! Health check endpoint

use axum::{Json, Router, routing::get};
use chrono::{DateTime, Local};
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Local>,
    pub message: &'static str,
}

/// Liveness probe
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Local::now(),
        message: "NeoMind server is running",
    })
}

/// Build health router
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}
