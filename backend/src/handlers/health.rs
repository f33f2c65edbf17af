//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub crops: usize,
    pub rescue_lots: usize,
    pub queued_pickups: usize,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        crops: state.assays.crop_keys().len(),
        rescue_lots: state.rescue.len().await,
        queued_pickups: state.logistics.queue_len().await,
    })
}
