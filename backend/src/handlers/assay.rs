//! HTTP handlers for harvest scanning, pricing and listings

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{DigitalAssay, RescueItem, SplitListing, TierSplit, UniversalPriceResult};
use validator::Validate;

use crate::error::AppResult;
use crate::services::ScanInput;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ScanRequestBody {
    #[validate(length(min = 1, max = 64))]
    pub crop_key: String,
    pub total_quantity_kg: Decimal,
    /// Explicit split, skipping both the remote model and the local strategy
    pub tier_split: Option<TierSplit>,
    #[validate(url)]
    pub sample_image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub assay: DigitalAssay,
    /// Set when the industrial tier went onto the rescue radar
    pub rescue_item: Option<RescueItem>,
}

/// Scan a harvested lot and register perishable surplus for rescue
pub async fn scan_harvest(
    State(state): State<AppState>,
    Json(body): Json<ScanRequestBody>,
) -> AppResult<Json<ScanResponse>> {
    body.validate()?;

    let assay = state
        .assays
        .scan(ScanInput {
            crop_key: body.crop_key,
            total_quantity_kg: body.total_quantity_kg,
            override_split: body.tier_split,
            sample_image_url: body.sample_image_url,
        })
        .await?;

    let rescue_item = if assay.rescue_eligible {
        let crop = state.assays.crop(&assay.crop_key)?;
        state.rescue.register_from_assay(&assay, &crop).await?
    } else {
        None
    };

    Ok(Json(ScanResponse { assay, rescue_item }))
}

/// Price a previously produced assay
pub async fn price_assay(
    State(state): State<AppState>,
    Json(assay): Json<DigitalAssay>,
) -> AppResult<Json<UniversalPriceResult>> {
    Ok(Json(state.assays.price(&assay)?))
}

/// Split a previously produced assay into listings
pub async fn split_listings(
    State(state): State<AppState>,
    Json(assay): Json<DigitalAssay>,
) -> AppResult<Json<Vec<SplitListing>>> {
    Ok(Json(state.assays.listings(&assay)?))
}
