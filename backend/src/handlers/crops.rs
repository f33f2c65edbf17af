//! HTTP handlers for the crop catalog

use axum::{
    extract::{Path, State},
    Json,
};
use shared::CropConfig;

use crate::error::AppResult;
use crate::AppState;

/// List every configured crop, ordered by key
pub async fn list_crops(State(state): State<AppState>) -> Json<Vec<CropConfig>> {
    let crops = state
        .assays
        .crop_keys()
        .iter()
        .filter_map(|key| state.assays.crop(key).ok())
        .collect();
    Json(crops)
}

/// Get one crop; keys are case-insensitive
pub async fn get_crop(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<CropConfig>> {
    Ok(Json(state.assays.crop(&key)?))
}
