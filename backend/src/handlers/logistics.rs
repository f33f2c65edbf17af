//! HTTP handlers for milk-run pickups

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::{MilkRunRoute, PickupCandidate};
use validator::Validate;

use crate::error::AppResult;
use crate::services::PickupCycleReport;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct BuildMilkRunBody {
    #[validate(length(min = 1))]
    pub factory_id: String,
    pub truck_capacity_kg: Option<i64>,
    #[validate(length(min = 1))]
    pub candidates: Vec<PickupCandidate>,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub queued: usize,
}

/// Build a one-off consolidated route
pub async fn build_milk_run(
    State(state): State<AppState>,
    Json(body): Json<BuildMilkRunBody>,
) -> AppResult<Json<MilkRunRoute>> {
    body.validate()?;
    let route = state
        .logistics
        .build(&body.factory_id, body.candidates, body.truck_capacity_kg)?;
    Ok(Json(route))
}

/// Queue a lot for the next scheduled cycle
pub async fn enqueue_pickup(
    State(state): State<AppState>,
    Json(candidate): Json<PickupCandidate>,
) -> AppResult<Json<EnqueueResponse>> {
    let queued = state.logistics.enqueue(candidate).await?;
    Ok(Json(EnqueueResponse { queued }))
}

/// Latest pickup cycle outcome
pub async fn latest_cycle(State(state): State<AppState>) -> Json<Option<PickupCycleReport>> {
    Json(state.logistics.latest().await)
}

/// Run a pickup cycle now instead of waiting for the schedule
pub async fn run_cycle(State(state): State<AppState>) -> AppResult<Json<PickupCycleReport>> {
    Ok(Json(state.logistics.run_cycle(Utc::now()).await?))
}
