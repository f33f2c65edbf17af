//! Tier classifier ("digital assay")
//!
//! Splits a harvested quantity into retail, market and industrial tiers.
//! The split itself comes from a [`TierSplitStrategy`]; the seeded random
//! strategy here is a stand-in until a real grading model is plugged in.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::assay::{DigitalAssay, SplitSource, Tier, TierBreakdown, TierSplit};
use super::crop::CropConfig;
use crate::catalog::CropCatalog;
use crate::error::{EngineError, EngineResult};
use crate::params::{ClassifierParams, HarvestParams, PricingLadder};
use crate::types::{checked_total, quintal_value, round_half_up, round_to_i64};
use crate::validation::{validate_quantity_kg, validate_tier_split};

/// Produces tier percentages for a crop lot
pub trait TierSplitStrategy: Send + Sync {
    fn split(&self, crop_key: &str, quantity_kg: Decimal) -> EngineResult<TierSplit>;
}

/// Random split drawn from configured ranges, reproducible from its seed
pub struct SeededRandomSplit {
    params: ClassifierParams,
    rng: Mutex<ChaCha8Rng>,
}

impl SeededRandomSplit {
    pub fn new(seed: u64, params: ClassifierParams) -> Self {
        Self {
            params,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl TierSplitStrategy for SeededRandomSplit {
    fn split(&self, _crop_key: &str, _quantity_kg: Decimal) -> EngineResult<TierSplit> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(draw_split(&mut *rng, &self.params))
    }
}

/// Always returns the same split
#[derive(Debug, Clone, Copy)]
pub struct FixedSplit(pub TierSplit);

impl TierSplitStrategy for FixedSplit {
    fn split(&self, _crop_key: &str, _quantity_kg: Decimal) -> EngineResult<TierSplit> {
        Ok(self.0)
    }
}

/// Draw tier 1 and tier 2 from their ranges and complete the split
pub fn draw_split<R: Rng + ?Sized>(rng: &mut R, params: &ClassifierParams) -> TierSplit {
    let tier1 = rng.gen_range(params.tier1_min_percent..=params.tier1_max_percent);
    let tier2 = rng.gen_range(params.tier2_min_percent..=params.tier2_max_percent);
    TierSplit::from_leading(tier1, tier2)
}

/// Request to assay one harvested lot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    pub crop_key: String,
    pub total_quantity_kg: Decimal,
    #[serde(default)]
    pub override_split: Option<TierSplit>,
}

impl ScanRequest {
    pub fn new(crop_key: impl Into<String>, total_quantity_kg: Decimal) -> Self {
        Self {
            crop_key: crop_key.into(),
            total_quantity_kg,
            override_split: None,
        }
    }

    pub fn with_override(mut self, split: TierSplit) -> Self {
        self.override_split = Some(split);
        self
    }
}

/// Assay a harvested lot.
///
/// Resolves the crop, validates the quantity, takes the override split if
/// present (otherwise asks the strategy), and derives per-tier quantities,
/// prices and values. Does nothing else: the same inputs give the same assay.
pub fn scan(
    catalog: &CropCatalog,
    strategy: &dyn TierSplitStrategy,
    request: &ScanRequest,
    params: &HarvestParams,
    scanned_at: DateTime<Utc>,
) -> EngineResult<DigitalAssay> {
    let crop = catalog.lookup(&request.crop_key)?;
    validate_quantity_kg(request.total_quantity_kg)?;

    let (split, source) = match request.override_split {
        Some(split) => (split, SplitSource::Override),
        None => {
            let split = strategy.split(&crop.key, request.total_quantity_kg)?;
            (split, SplitSource::Strategy)
        }
    };
    validate_tier_split(&split).map_err(|e| match (source, e) {
        (SplitSource::Strategy, EngineError::InvalidInput { message, .. }) => {
            EngineError::GradingUnavailable(format!("strategy returned a bad split: {}", message))
        }
        (_, e) => e,
    })?;

    build_assay(
        crop,
        request.total_quantity_kg,
        split,
        source,
        params,
        scanned_at,
    )
}

/// Check a client-supplied assay against the crop table before reusing it.
///
/// The assay is rebuilt from its crop, quantity, split and scan time; any
/// tier figure or retail price that differs from the rebuilt one is rejected.
/// Returns the rebuilt assay.
pub fn verify_assay(
    catalog: &CropCatalog,
    assay: &DigitalAssay,
    params: &HarvestParams,
) -> EngineResult<DigitalAssay> {
    let crop = catalog.lookup(&assay.crop_key)?;
    validate_quantity_kg(assay.total_quantity_kg)?;
    let split = TierSplit::new(
        assay.tiers[0].percentage,
        assay.tiers[1].percentage,
        assay.tiers[2].percentage,
    );
    validate_tier_split(&split)?;

    let rebuilt = build_assay(
        crop,
        assay.total_quantity_kg,
        split,
        assay.split_source,
        params,
        assay.scanned_at,
    )?;
    if rebuilt.retail_price_per_qtl != assay.retail_price_per_qtl {
        return Err(EngineError::invalid(
            "retail_price_per_qtl",
            format!(
                "retail price does not match the {} crop entry",
                crop.key
            ),
        ));
    }
    if rebuilt.tiers != assay.tiers || rebuilt.total_value != assay.total_value {
        return Err(EngineError::invalid(
            "tiers",
            "tier figures do not match the assay's quantity and split",
        ));
    }
    Ok(rebuilt)
}

fn tier_price(retail: Decimal, tier: Tier, ladder: &PricingLadder) -> Decimal {
    let factor = match tier {
        Tier::Retail => ladder.retail_factor,
        Tier::Market => ladder.mandi_factor,
        Tier::Industrial => ladder.factory_factor,
    };
    round_half_up(retail * factor)
}

fn destination(crop: &CropConfig, tier: Tier) -> &str {
    match tier {
        Tier::Retail => &crop.tier1_destination,
        Tier::Market => &crop.tier2_destination,
        Tier::Industrial => &crop.tier3_destination,
    }
}

fn build_assay(
    crop: &CropConfig,
    total_quantity_kg: Decimal,
    split: TierSplit,
    split_source: SplitSource,
    params: &HarvestParams,
    scanned_at: DateTime<Utc>,
) -> EngineResult<DigitalAssay> {
    let mut tiers = Tier::ALL.map(|tier| {
        let percentage = split.percent(tier);
        TierBreakdown {
            tier,
            label: tier.label().to_string(),
            percentage,
            quantity_kg: round_to_i64(
                total_quantity_kg * Decimal::from(percentage) / Decimal::from(100),
            ),
            destination: destination(crop, tier).to_string(),
            price_per_qtl: tier_price(crop.retail_price_per_qtl, tier, &params.pricing),
            total_value: Decimal::ZERO,
        }
    });
    for t in tiers.iter_mut() {
        t.total_value = quintal_value(t.quantity_kg, t.price_per_qtl)?;
    }

    let total_value = checked_total(tiers.iter().map(|t| &t.total_value))?;
    let is_perishable = crop.is_perishable(params.perishability.perishable_below_hours);
    let rescue_eligible = is_perishable && tiers[2].quantity_kg > 0;

    Ok(DigitalAssay {
        crop_key: crop.key.clone(),
        crop_name: crop.name.clone(),
        total_quantity_kg,
        scanned_at,
        tiers,
        total_value,
        retail_price_per_qtl: crop.retail_price_per_qtl,
        factory_buyer: crop.factory_buyer.clone(),
        transport: crop.transport,
        carbon_risk: crop.carbon_risk,
        shelf_life_hours: crop.shelf_life_hours,
        is_perishable,
        rescue_eligible,
        split_source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn scanned_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 5, 6, 30, 0).unwrap()
    }

    fn setup() -> (CropCatalog, HarvestParams) {
        (CropCatalog::builtin().unwrap(), HarvestParams::default())
    }

    #[test]
    fn test_from_leading_clamps_tier3() {
        assert_eq!(TierSplit::from_leading(70, 35), TierSplit::new(70, 30, 0));
        assert_eq!(TierSplit::from_leading(45, 15), TierSplit::new(45, 15, 40));
        assert_eq!(TierSplit::from_leading(65, 35), TierSplit::new(65, 35, 0));
    }

    #[test]
    fn test_seeded_strategy_is_reproducible() {
        let params = ClassifierParams::default();
        let a = SeededRandomSplit::new(42, params.clone());
        let b = SeededRandomSplit::new(42, params);
        for _ in 0..20 {
            assert_eq!(
                a.split("tomato", Decimal::from(100)).unwrap(),
                b.split("tomato", Decimal::from(100)).unwrap()
            );
        }
    }

    #[test]
    fn test_random_split_within_ranges() {
        let params = ClassifierParams::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let split = draw_split(&mut rng, &params);
            assert_eq!(split.total(), 100);
            assert!((45..=70).contains(&split.tier1_percent));
            assert!(split.tier2_percent >= 15);
            assert!(split.tier3_percent >= 0);
        }
    }

    #[test]
    fn test_scan_with_override_tomato() {
        let (catalog, params) = setup();
        let request =
            ScanRequest::new("tomato", Decimal::from(1000)).with_override(TierSplit::new(40, 30, 30));
        let strategy = FixedSplit(TierSplit::new(60, 20, 20));
        let assay = scan(&catalog, &strategy, &request, &params, scanned_at()).unwrap();

        assert_eq!(assay.split_source, SplitSource::Override);
        assert_eq!(assay.tier(Tier::Retail).quantity_kg, 400);
        assert_eq!(assay.tier(Tier::Market).price_per_qtl, Decimal::from(1750));
        assert_eq!(assay.tier(Tier::Industrial).total_value, Decimal::from(2250));
        assert_eq!(assay.total_value, Decimal::from(17500));
        assert!(assay.is_perishable);
        assert!(assay.rescue_eligible);
    }

    #[test]
    fn test_scan_uses_strategy_without_override() {
        let (catalog, params) = setup();
        let strategy = FixedSplit(TierSplit::new(60, 40, 0));
        let request = ScanRequest::new("tomato", Decimal::from(500));
        let assay = scan(&catalog, &strategy, &request, &params, scanned_at()).unwrap();

        assert_eq!(assay.split_source, SplitSource::Strategy);
        assert_eq!(assay.tier(Tier::Industrial).quantity_kg, 0);
        assert!(assay.is_perishable);
        assert!(!assay.rescue_eligible);
    }

    #[test]
    fn test_scan_non_perishable_not_rescue_eligible() {
        let (catalog, params) = setup();
        let strategy = FixedSplit(TierSplit::new(50, 25, 25));
        let request = ScanRequest::new("onion", Decimal::from(800));
        let assay = scan(&catalog, &strategy, &request, &params, scanned_at()).unwrap();
        assert!(!assay.is_perishable);
        assert!(!assay.rescue_eligible);
    }

    #[test]
    fn test_scan_bad_override_rejected() {
        let (catalog, params) = setup();
        let strategy = FixedSplit(TierSplit::new(50, 25, 25));
        let request =
            ScanRequest::new("tomato", Decimal::from(100)).with_override(TierSplit::new(50, 30, 30));
        assert!(matches!(
            scan(&catalog, &strategy, &request, &params, scanned_at()),
            Err(EngineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_scan_bad_strategy_output_reported_as_grading_failure() {
        let (catalog, params) = setup();
        let strategy = FixedSplit(TierSplit::new(90, 30, 0));
        let request = ScanRequest::new("tomato", Decimal::from(100));
        assert!(matches!(
            scan(&catalog, &strategy, &request, &params, scanned_at()),
            Err(EngineError::GradingUnavailable(_))
        ));
    }

    #[test]
    fn test_scan_unknown_crop() {
        let (catalog, params) = setup();
        let strategy = FixedSplit(TierSplit::new(50, 25, 25));
        let request = ScanRequest::new("durian", Decimal::from(100));
        assert_eq!(
            scan(&catalog, &strategy, &request, &params, scanned_at()).unwrap_err(),
            EngineError::crop_not_found("durian")
        );
    }

    #[test]
    fn test_scan_zero_quantity() {
        let (catalog, params) = setup();
        let strategy = FixedSplit(TierSplit::new(50, 25, 25));
        let request = ScanRequest::new("tomato", Decimal::ZERO);
        assert!(matches!(
            scan(&catalog, &strategy, &request, &params, scanned_at()),
            Err(EngineError::InvalidInput { .. })
        ));
    }
}
