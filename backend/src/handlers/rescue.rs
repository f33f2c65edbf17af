//! HTTP handlers for the rescue radar

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{evaluate_rescue, RescueItem, RescueLot};
use validator::Validate;

use crate::error::AppResult;
use crate::AppState;

/// Ad-hoc evaluation of a lot that is not on the radar
#[derive(Debug, Deserialize, Validate)]
pub struct EvaluateRescueBody {
    #[validate(length(min = 1))]
    pub crop_name: String,
    #[validate(length(min = 1))]
    pub crop_key: String,
    #[validate(range(min = 1))]
    pub quantity_kg: i64,
    pub hours_since_harvest: f64,
    pub shelf_life_hours: u32,
    pub original_price_per_qtl: Decimal,
    #[validate(length(min = 1))]
    pub rescue_channels: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ClaimRescueBody {
    #[validate(length(min = 1, max = 128))]
    pub buyer_id: String,
}

/// Evaluate a lot at a given elapsed time without registering it
pub async fn evaluate(
    State(state): State<AppState>,
    Json(body): Json<EvaluateRescueBody>,
) -> AppResult<Json<RescueItem>> {
    body.validate()?;
    let lot = RescueLot {
        id: format!("adhoc-{}", body.crop_key),
        crop_key: body.crop_key,
        crop_name: body.crop_name,
        quantity_kg: body.quantity_kg,
        shelf_life_hours: body.shelf_life_hours,
        original_price_per_qtl: body.original_price_per_qtl,
        rescue_channels: body.rescue_channels,
    };
    let item = evaluate_rescue(&lot, body.hours_since_harvest, &state.config.engine.rescue)?;
    Ok(Json(item))
}

/// Radar view, most urgent first
pub async fn list_rescue(State(state): State<AppState>) -> AppResult<Json<Vec<RescueItem>>> {
    Ok(Json(state.rescue.radar(Utc::now()).await?))
}

pub async fn get_rescue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<RescueItem>> {
    Ok(Json(state.rescue.get(&id, Utc::now()).await?))
}

/// Claim a lot; a second claimant gets 409
pub async fn claim_rescue(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ClaimRescueBody>,
) -> AppResult<Json<RescueItem>> {
    body.validate()?;
    Ok(Json(state.rescue.claim(&id, &body.buyer_id, Utc::now()).await?))
}
