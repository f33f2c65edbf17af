//! Tunable engine parameters
//!
//! The split ranges, discount factors and thresholds below are demo-tuned
//! values with no empirical source behind them. They are kept as data so a
//! deployment can override them from configuration once field data exists.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::TransportMode;

/// All tunable parameters of the harvest engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct HarvestParams {
    pub classifier: ClassifierParams,
    pub pricing: PricingLadder,
    pub perishability: PerishabilityParams,
    pub rescue: RescueParams,
    pub carbon: CarbonParams,
    pub milk_run: MilkRunParams,
}

/// Ranges for the placeholder random tier split (inclusive percentages)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierParams {
    pub tier1_min_percent: i32,
    pub tier1_max_percent: i32,
    pub tier2_min_percent: i32,
    pub tier2_max_percent: i32,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            tier1_min_percent: 45,
            tier1_max_percent: 70,
            tier2_min_percent: 15,
            tier2_max_percent: 35,
        }
    }
}

/// Price factors relative to the crop's retail price per quintal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PricingLadder {
    pub retail_factor: Decimal,
    pub mandi_factor: Decimal,
    pub factory_factor: Decimal,
}

impl Default for PricingLadder {
    fn default() -> Self {
        Self {
            retail_factor: Decimal::ONE,
            mandi_factor: Decimal::new(7, 1),
            factory_factor: Decimal::new(3, 1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerishabilityParams {
    /// Crops with a shelf life strictly below this are perishable
    pub perishable_below_hours: f64,
}

impl Default for PerishabilityParams {
    fn default() -> Self {
        Self {
            perishable_below_hours: 48.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RescueParams {
    /// Percent of shelf life used at which the flash sale starts
    pub flash_threshold_percent: i64,
    /// Flash price as a fraction of the original price (0.3 = 70% off)
    pub flash_price_factor: Decimal,
    /// Percent of shelf life used at which an unclaimed lot expires
    pub expiry_percent: i64,
}

impl Default for RescueParams {
    fn default() -> Self {
        Self {
            flash_threshold_percent: 80,
            flash_price_factor: Decimal::new(3, 1),
            expiry_percent: 100,
        }
    }
}

/// Emission factors in kg CO2 per kg of produce per 100 km at full load
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmissionFactors {
    pub refrigerated: f64,
    pub ventilated_van: f64,
    pub padded_box: f64,
    pub crate_stackable: f64,
    pub open_crate: f64,
    pub sack: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            refrigerated: 0.045,
            ventilated_van: 0.030,
            padded_box: 0.025,
            crate_stackable: 0.020,
            open_crate: 0.018,
            sack: 0.015,
        }
    }
}

impl EmissionFactors {
    pub fn factor_for(&self, mode: TransportMode) -> f64 {
        match mode {
            TransportMode::Refrigerated => self.refrigerated,
            TransportMode::VentilatedVan => self.ventilated_van,
            TransportMode::PaddedBox => self.padded_box,
            TransportMode::CrateStackable => self.crate_stackable,
            TransportMode::OpenCrate => self.open_crate,
            TransportMode::Sack => self.sack,
        }
    }

    fn ambient(&self) -> [f64; 5] {
        [
            self.ventilated_van,
            self.padded_box,
            self.crate_stackable,
            self.open_crate,
            self.sack,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CarbonParams {
    pub emission_factors: EmissionFactors,
    /// Trips at or under this distance count as a local loop
    pub local_loop_km: f64,
    /// Penalty per km charged on trips outside the local loop
    pub per_km_penalty: f64,
    /// Fill rate at or above which a trip earns green certification
    pub green_fill_threshold_percent: f64,
}

impl Default for CarbonParams {
    fn default() -> Self {
        Self {
            emission_factors: EmissionFactors::default(),
            local_loop_km: 50.0,
            per_km_penalty: 0.05,
            green_fill_threshold_percent: 90.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MilkRunParams {
    /// Candidates farther than this from the factory are left for another cycle
    pub max_detour_km: f64,
    /// Extra distance added per intermediate stop on a consolidated route
    pub stop_detour_km: f64,
}

impl Default for MilkRunParams {
    fn default() -> Self {
        Self {
            max_detour_km: 40.0,
            stop_detour_km: 2.0,
        }
    }
}

impl HarvestParams {
    /// Check internal consistency; run once at startup
    pub fn validate(&self) -> EngineResult<()> {
        let c = &self.classifier;
        let in_percent = |v: i32| (0..=100).contains(&v);
        if ![
            c.tier1_min_percent,
            c.tier1_max_percent,
            c.tier2_min_percent,
            c.tier2_max_percent,
        ]
        .into_iter()
        .all(in_percent)
        {
            return Err(EngineError::InvalidConfig(
                "classifier ranges must lie within 0-100".to_string(),
            ));
        }
        if c.tier1_min_percent > c.tier1_max_percent || c.tier2_min_percent > c.tier2_max_percent {
            return Err(EngineError::InvalidConfig(
                "classifier range minimum exceeds maximum".to_string(),
            ));
        }
        if c.tier1_min_percent + c.tier2_min_percent > 100 {
            return Err(EngineError::InvalidConfig(
                "classifier minimums leave no room for a 100% split".to_string(),
            ));
        }

        let p = &self.pricing;
        if !(Decimal::ZERO < p.factory_factor
            && p.factory_factor < p.mandi_factor
            && p.mandi_factor < p.retail_factor)
        {
            return Err(EngineError::InvalidConfig(
                "price ladder must satisfy 0 < factory < mandi < retail".to_string(),
            ));
        }

        if self.perishability.perishable_below_hours <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "perishability cutoff must be positive".to_string(),
            ));
        }

        let r = &self.rescue;
        if r.flash_price_factor <= Decimal::ZERO || r.flash_price_factor > Decimal::ONE {
            return Err(EngineError::InvalidConfig(
                "flash price factor must be in (0, 1]".to_string(),
            ));
        }
        if r.flash_threshold_percent <= 0 || r.flash_threshold_percent >= r.expiry_percent {
            return Err(EngineError::InvalidConfig(
                "flash threshold must be positive and below the expiry percent".to_string(),
            ));
        }

        let carbon = &self.carbon;
        let factors = &carbon.emission_factors;
        let ambient = factors.ambient();
        if factors.refrigerated <= 0.0 || ambient.iter().any(|f| *f <= 0.0) {
            return Err(EngineError::InvalidConfig(
                "emission factors must be positive".to_string(),
            ));
        }
        if ambient.iter().any(|f| *f >= factors.refrigerated) {
            return Err(EngineError::InvalidConfig(
                "refrigerated emission factor must exceed every ambient factor".to_string(),
            ));
        }
        if carbon.local_loop_km < 0.0 || carbon.per_km_penalty < 0.0 {
            return Err(EngineError::InvalidConfig(
                "carbon distances and penalties cannot be negative".to_string(),
            ));
        }
        if carbon.green_fill_threshold_percent <= 0.0
            || carbon.green_fill_threshold_percent > 100.0
        {
            return Err(EngineError::InvalidConfig(
                "green fill threshold must be in (0, 100]".to_string(),
            ));
        }

        if self.milk_run.max_detour_km <= 0.0 || self.milk_run.stop_detour_km < 0.0 {
            return Err(EngineError::InvalidConfig(
                "milk-run detour settings are out of range".to_string(),
            ));
        }

        Ok(())
    }
}
