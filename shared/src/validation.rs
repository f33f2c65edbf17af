//! Input validation for engine operations

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::TierSplit;

/// Largest single lot the engine accepts (10,000 tonnes)
pub const MAX_LOT_KG: i64 = 10_000_000;

// ============================================================================
// Harvest Validations
// ============================================================================

/// Validate that each tier percentage lies in 0..=100 and they sum to 100
pub fn validate_tier_split(split: &TierSplit) -> EngineResult<()> {
    let percents = [split.tier1_percent, split.tier2_percent, split.tier3_percent];
    if percents.iter().any(|p| *p < 0) {
        return Err(EngineError::invalid(
            "override_split",
            "tier percentages cannot be negative",
        ));
    }
    if percents.iter().any(|p| *p > 100) {
        return Err(EngineError::invalid(
            "override_split",
            "a tier percentage cannot exceed 100",
        ));
    }
    if split.total() != 100 {
        return Err(EngineError::invalid(
            "override_split",
            format!("tier percentages must sum to 100, got {}", split.total()),
        ));
    }
    Ok(())
}

/// Validate a harvested quantity in kilograms
pub fn validate_quantity_kg(quantity_kg: Decimal) -> EngineResult<()> {
    if quantity_kg <= Decimal::ZERO {
        return Err(EngineError::invalid(
            "total_quantity_kg",
            "quantity must be greater than zero",
        ));
    }
    if quantity_kg > Decimal::from(MAX_LOT_KG) {
        return Err(EngineError::invalid(
            "total_quantity_kg",
            format!("quantity exceeds the {} kg lot limit", MAX_LOT_KG),
        ));
    }
    Ok(())
}

/// Validate a whole-kilogram lot such as a pickup stop
pub fn validate_lot_kg(field: &str, quantity_kg: i64) -> EngineResult<()> {
    if quantity_kg <= 0 {
        return Err(EngineError::invalid(field, "quantity must be greater than zero"));
    }
    if quantity_kg > MAX_LOT_KG {
        return Err(EngineError::invalid(
            field,
            format!("quantity exceeds the {} kg lot limit", MAX_LOT_KG),
        ));
    }
    Ok(())
}

/// Validate a price per quintal
pub fn validate_price_per_qtl(field: &str, price: Decimal) -> EngineResult<()> {
    if price <= Decimal::ZERO {
        return Err(EngineError::invalid(field, "price must be greater than zero"));
    }
    Ok(())
}

// ============================================================================
// Logistics Validations
// ============================================================================

/// Validate a road distance in kilometres
pub fn validate_distance_km(field: &str, distance_km: f64) -> EngineResult<()> {
    if !distance_km.is_finite() {
        return Err(EngineError::invalid(field, "distance must be a finite number"));
    }
    if distance_km < 0.0 {
        return Err(EngineError::invalid(field, "distance cannot be negative"));
    }
    Ok(())
}

/// Validate a truck fill rate; an empty truck has no per-kg emissions to report
pub fn validate_fill_percent(fill_percent: f64) -> EngineResult<()> {
    if !fill_percent.is_finite() || fill_percent <= 0.0 || fill_percent > 100.0 {
        return Err(EngineError::invalid(
            "truck_fill_percent",
            "fill rate must be greater than 0 and at most 100",
        ));
    }
    Ok(())
}

/// Validate elapsed hours since harvest
pub fn validate_elapsed_hours(hours: f64) -> EngineResult<()> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(EngineError::invalid(
            "hours_since_harvest",
            "elapsed hours cannot be negative",
        ));
    }
    Ok(())
}
