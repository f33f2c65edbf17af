//! Rescue radar: time-decay markdown of perishable industrial-grade surplus
//!
//! A rescue lot moves through `Active` (standard price, then flash price once
//! most of its shelf life is gone) to one of two terminal states: `Claimed`
//! by a buyer, or `Expired` when shelf life runs out. Percent of life used is
//! recomputed from elapsed time on every evaluation and never stored.

use std::sync::atomic::{AtomicU8, Ordering};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::assay::{DigitalAssay, Tier};
use super::crop::CropConfig;
use crate::error::{EngineError, EngineResult};
use crate::params::RescueParams;
use crate::types::{round_f64, round_half_up};
use crate::validation::{validate_elapsed_hours, validate_lot_kg, validate_price_per_qtl};

/// Lifecycle state of a rescue lot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RescueStatus {
    Active,
    Claimed,
    Expired,
}

impl RescueStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RescueStatus::Active)
    }

    fn to_u8(self) -> u8 {
        match self {
            RescueStatus::Active => 0,
            RescueStatus::Claimed => 1,
            RescueStatus::Expired => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => RescueStatus::Active,
            1 => RescueStatus::Claimed,
            _ => RescueStatus::Expired,
        }
    }
}

/// Price phase of an active lot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RescuePricing {
    Standard,
    FlashSale,
}

/// Immutable description of a surplus lot placed on the radar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RescueLot {
    pub id: String,
    pub crop_key: String,
    pub crop_name: String,
    pub quantity_kg: i64,
    pub shelf_life_hours: u32,
    pub original_price_per_qtl: Decimal,
    pub rescue_channels: Vec<String>,
}

impl RescueLot {
    /// Build a lot from the industrial tier of a rescue-eligible assay
    pub fn from_assay(id: impl Into<String>, assay: &DigitalAssay, crop: &CropConfig) -> Option<Self> {
        if !assay.rescue_eligible {
            return None;
        }
        let industrial = assay.tier(Tier::Industrial);
        Some(Self {
            id: id.into(),
            crop_key: assay.crop_key.clone(),
            crop_name: assay.crop_name.clone(),
            quantity_kg: industrial.quantity_kg,
            shelf_life_hours: assay.shelf_life_hours,
            original_price_per_qtl: industrial.price_per_qtl,
            rescue_channels: crop.rescue_channels.clone(),
        })
    }
}

/// Point-in-time view of a rescue lot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RescueItem {
    pub id: String,
    pub crop_key: String,
    pub crop_name: String,
    pub quantity_kg: i64,
    pub hours_since_harvest: f64,
    pub shelf_life_hours: u32,
    pub hours_remaining: f64,
    pub percent_life_used: i64,
    pub original_price_per_qtl: Decimal,
    pub flash_price_per_qtl: Decimal,
    pub pricing: RescuePricing,
    pub rescue_channels: Vec<String>,
    pub status: RescueStatus,
}

/// round(hours / shelf_life * 100); a zero shelf life counts as fully used
pub fn percent_life_used(hours_since_harvest: f64, shelf_life_hours: u32) -> i64 {
    if shelf_life_hours == 0 {
        return 100;
    }
    (hours_since_harvest / f64::from(shelf_life_hours) * 100.0).round() as i64
}

/// Evaluate an unclaimed lot at the given elapsed time
pub fn evaluate_rescue(
    lot: &RescueLot,
    hours_since_harvest: f64,
    params: &RescueParams,
) -> EngineResult<RescueItem> {
    evaluate_rescue_with_status(lot, hours_since_harvest, RescueStatus::Active, params)
}

/// Evaluate a lot whose last recorded status is `status`.
///
/// Terminal statuses stay as they are; an active lot reports `Expired` once
/// its shelf life is used up. Pricing follows elapsed time alone.
pub fn evaluate_rescue_with_status(
    lot: &RescueLot,
    hours_since_harvest: f64,
    status: RescueStatus,
    params: &RescueParams,
) -> EngineResult<RescueItem> {
    validate_elapsed_hours(hours_since_harvest)?;
    validate_lot_kg("quantity_kg", lot.quantity_kg)?;
    validate_price_per_qtl("original_price_per_qtl", lot.original_price_per_qtl)?;
    if lot.shelf_life_hours == 0 {
        return Err(EngineError::invalid(
            "shelf_life_hours",
            "shelf life must be positive",
        ));
    }
    if lot.rescue_channels.is_empty() {
        return Err(EngineError::invalid(
            "rescue_channels",
            "a rescue lot needs at least one rescue channel",
        ));
    }

    let percent = percent_life_used(hours_since_harvest, lot.shelf_life_hours);
    let (pricing, flash_price_per_qtl) = if percent >= params.flash_threshold_percent {
        (
            RescuePricing::FlashSale,
            round_half_up(lot.original_price_per_qtl * params.flash_price_factor),
        )
    } else {
        (RescuePricing::Standard, lot.original_price_per_qtl)
    };

    let status = match status {
        RescueStatus::Active if percent >= params.expiry_percent => RescueStatus::Expired,
        other => other,
    };

    Ok(RescueItem {
        id: lot.id.clone(),
        crop_key: lot.crop_key.clone(),
        crop_name: lot.crop_name.clone(),
        quantity_kg: lot.quantity_kg,
        hours_since_harvest,
        shelf_life_hours: lot.shelf_life_hours,
        hours_remaining: round_f64(
            (f64::from(lot.shelf_life_hours) - hours_since_harvest).max(0.0),
            2,
        ),
        percent_life_used: percent,
        original_price_per_qtl: lot.original_price_per_qtl,
        flash_price_per_qtl,
        pricing,
        rescue_channels: lot.rescue_channels.clone(),
        status,
    })
}

/// Shared status of one rescue lot.
///
/// The only mutable state in the engine. Transitions out of `Active` are a
/// single compare-and-set, so exactly one caller wins a claim.
#[derive(Debug)]
pub struct RescueStatusCell(AtomicU8);

impl Default for RescueStatusCell {
    fn default() -> Self {
        Self(AtomicU8::new(RescueStatus::Active.to_u8()))
    }
}

impl RescueStatusCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> RescueStatus {
        RescueStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    fn transition(&self, from: RescueStatus, to: RescueStatus) -> Result<(), RescueStatus> {
        self.0
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(RescueStatus::from_u8)
    }

    /// Attempt to claim the lot at the given percent of life used.
    ///
    /// Fails with `ConcurrencyConflict` if someone else already claimed it and
    /// with `Expired` if shelf life has run out.
    pub fn try_claim(&self, percent_life_used: i64, params: &RescueParams) -> EngineResult<()> {
        if percent_life_used >= params.expiry_percent {
            self.expire_if_due(percent_life_used, params);
        }
        match self.transition(RescueStatus::Active, RescueStatus::Claimed) {
            Ok(()) => Ok(()),
            Err(RescueStatus::Claimed) => Err(EngineError::ConcurrencyConflict(
                "rescue lot has already been claimed".to_string(),
            )),
            Err(_) => Err(EngineError::Expired(
                "rescue lot passed its shelf life before it was claimed".to_string(),
            )),
        }
    }

    /// Move an active lot to `Expired` if its shelf life is used up.
    ///
    /// Returns true only for the caller that performed the transition.
    pub fn expire_if_due(&self, percent_life_used: i64, params: &RescueParams) -> bool {
        percent_life_used >= params.expiry_percent
            && self
                .transition(RescueStatus::Active, RescueStatus::Expired)
                .is_ok()
    }
}
