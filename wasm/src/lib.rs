//! WebAssembly module for the Harvest Rescue Engine
//!
//! Lets field apps run the engine offline:
//! - Assaying a lot with an explicit tier split
//! - Pricing an assay
//! - Rescue urgency and carbon estimates
//!
//! Structured results cross the boundary as JSON strings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use shared::{
    compute_carbon, evaluate_rescue, percent_life_used, price_assay, scan, validate_tier_split,
    verify_assay, CarbonParams, CropCatalog, DigitalAssay, EngineError, FixedSplit, HarvestParams,
    RescueLot, RescueParams, ScanRequest, TierSplit, TransportMode, KG_PER_QUINTAL,
};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&"harvest rescue engine ready".into());
}

fn to_js_error(message: String) -> JsValue {
    web_sys::console::error_1(&message.clone().into());
    JsValue::from_str(&message)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization failed: {}", e))
}

fn engine_error(e: EngineError) -> String {
    e.to_string()
}

fn scan_json(
    crop_key: &str,
    total_quantity_kg: f64,
    split: TierSplit,
    scanned_at: DateTime<Utc>,
) -> Result<String, String> {
    let catalog = CropCatalog::builtin().map_err(engine_error)?;
    let quantity = Decimal::try_from(total_quantity_kg)
        .map_err(|_| format!("Invalid quantity: {}", total_quantity_kg))?;
    let request = ScanRequest::new(crop_key, quantity).with_override(split);
    let assay = scan(
        &catalog,
        &FixedSplit(split),
        &request,
        &HarvestParams::default(),
        scanned_at,
    )
    .map_err(engine_error)?;
    to_json(&assay)
}

fn price_json(assay_json: &str) -> Result<String, String> {
    let assay: DigitalAssay =
        serde_json::from_str(assay_json).map_err(|e| format!("Invalid assay JSON: {}", e))?;
    let catalog = CropCatalog::builtin().map_err(engine_error)?;
    let params = HarvestParams::default();
    let assay = verify_assay(&catalog, &assay, &params).map_err(engine_error)?;
    to_json(&price_assay(&assay, &params.pricing).map_err(engine_error)?)
}

/// Assay a lot with an explicit split; `scanned_at_ms` defaults to now when NaN
#[wasm_bindgen]
pub fn scan_lot(
    crop_key: &str,
    total_quantity_kg: f64,
    tier1_percent: i32,
    tier2_percent: i32,
    tier3_percent: i32,
    scanned_at_ms: f64,
) -> Result<String, JsValue> {
    let millis = if scanned_at_ms.is_finite() {
        scanned_at_ms
    } else {
        js_sys::Date::now()
    };
    let scanned_at = DateTime::from_timestamp_millis(millis as i64)
        .ok_or_else(|| to_js_error(format!("Invalid timestamp: {}", millis)))?;
    let split = TierSplit::new(tier1_percent, tier2_percent, tier3_percent);
    scan_json(crop_key, total_quantity_kg, split, scanned_at).map_err(to_js_error)
}

/// Price an assay produced by [`scan_lot`]
#[wasm_bindgen]
pub fn price_assay_json(assay_json: &str) -> Result<String, JsValue> {
    price_json(assay_json).map_err(to_js_error)
}

/// Percent of shelf life used, rounded
#[wasm_bindgen]
pub fn shelf_life_used(hours_since_harvest: f64, shelf_life_hours: u32) -> i64 {
    percent_life_used(hours_since_harvest, shelf_life_hours)
}

/// Rescue price per quintal at the given elapsed time
#[wasm_bindgen]
pub fn rescue_price(
    original_price_per_qtl: f64,
    hours_since_harvest: f64,
    shelf_life_hours: u32,
) -> Result<f64, JsValue> {
    rescue_price_inner(original_price_per_qtl, hours_since_harvest, shelf_life_hours)
        .map_err(to_js_error)
}

fn rescue_price_inner(
    original_price_per_qtl: f64,
    hours_since_harvest: f64,
    shelf_life_hours: u32,
) -> Result<f64, String> {
    let original = Decimal::try_from(original_price_per_qtl)
        .map_err(|_| format!("Invalid price: {}", original_price_per_qtl))?;
    let lot = RescueLot {
        id: "offline".to_string(),
        crop_key: String::new(),
        crop_name: String::new(),
        quantity_kg: KG_PER_QUINTAL,
        shelf_life_hours,
        original_price_per_qtl: original,
        rescue_channels: vec!["offline".to_string()],
    };
    let item = evaluate_rescue(&lot, hours_since_harvest, &RescueParams::default())
        .map_err(engine_error)?;
    item.flash_price_per_qtl
        .to_string()
        .parse()
        .map_err(|_| "Price out of range".to_string())
}

/// Per-kg CO2 estimate for a trip, as JSON
#[wasm_bindgen]
pub fn compute_carbon_footprint(
    transport_method: &str,
    distance_km: f64,
    truck_fill_percent: f64,
) -> Result<String, JsValue> {
    carbon_json(transport_method, distance_km, truck_fill_percent).map_err(to_js_error)
}

fn carbon_json(
    transport_method: &str,
    distance_km: f64,
    truck_fill_percent: f64,
) -> Result<String, String> {
    let mode: TransportMode = transport_method.parse().map_err(engine_error)?;
    let summary = compute_carbon(mode, distance_km, truck_fill_percent, &CarbonParams::default())
        .map_err(engine_error)?;
    to_json(&summary)
}

/// Check a tier split before submitting it (non-negative, sums to 100)
#[wasm_bindgen]
pub fn is_valid_tier_split(tier1: i32, tier2: i32, tier3: i32) -> bool {
    validate_tier_split(&TierSplit::new(tier1, tier2, tier3)).is_ok()
}

/// Crop keys known to the offline catalog, as a JSON array
#[wasm_bindgen]
pub fn crop_keys() -> String {
    CropCatalog::builtin()
        .map(|c| c.list_keys())
        .ok()
        .and_then(|keys| serde_json::to_string(&keys).ok())
        .unwrap_or_else(|| "[]".to_string())
}
