//! HTTP handler for trip carbon estimates

use axum::{extract::State, Json};
use serde::Deserialize;
use shared::{CarbonSummary, TransportMode};

use crate::error::AppResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CarbonBody {
    pub transport_method: TransportMode,
    pub distance_km: f64,
    pub truck_fill_percent: f64,
}

pub async fn carbon_footprint(
    State(state): State<AppState>,
    Json(body): Json<CarbonBody>,
) -> AppResult<Json<CarbonSummary>> {
    let summary =
        state
            .logistics
            .carbon(body.transport_method, body.distance_km, body.truck_fill_percent)?;
    Ok(Json(summary))
}
