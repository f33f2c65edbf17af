//! Universal pricing algorithm
//!
//! Prices each tier of an assay off a fixed ladder relative to the crop's
//! retail price, and compares the realized value with selling everything at
//! retail.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::assay::{DigitalAssay, Tier};
use crate::error::{EngineError, EngineResult};
use crate::params::PricingLadder;
use crate::types::{checked_total, percent_of, quintal_value, round_half_up, KG_PER_QUINTAL};

/// Retail, mandi and factory prices for one crop
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceLadder {
    pub retail_price: Decimal,
    pub mandi_price: Decimal,
    pub factory_price: Decimal,
}

impl PriceLadder {
    pub fn from_retail(retail_price: Decimal, ladder: &PricingLadder) -> Self {
        Self {
            retail_price: round_half_up(retail_price * ladder.retail_factor),
            mandi_price: round_half_up(retail_price * ladder.mandi_factor),
            factory_price: round_half_up(retail_price * ladder.factory_factor),
        }
    }

    pub fn price_for(&self, tier: Tier) -> Decimal {
        match tier {
            Tier::Retail => self.retail_price,
            Tier::Market => self.mandi_price,
            Tier::Industrial => self.factory_price,
        }
    }

    /// factory < mandi < retail
    pub fn is_monotonic(&self) -> bool {
        self.factory_price < self.mandi_price && self.mandi_price < self.retail_price
    }
}

/// Priced quantity of one tier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierPrice {
    pub tier: Tier,
    pub quantity_kg: i64,
    pub price_per_qtl: Decimal,
    pub value: Decimal,
}

/// Output of [`price_assay`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UniversalPriceResult {
    pub crop_key: String,
    pub ladder: PriceLadder,
    pub tiers: Vec<TierPrice>,
    pub total_value: Decimal,
    /// Total value as a percentage of selling the whole lot at retail
    pub compared_to_all_retail: i64,
    /// Cash realized from industrial-grade material that would otherwise be discarded
    pub value_saved: Decimal,
}

/// Price an assay with the given ladder
///
/// Values are computed with checked arithmetic; a lot too large to value
/// is reported as invalid input.
pub fn price_assay(
    assay: &DigitalAssay,
    ladder: &PricingLadder,
) -> EngineResult<UniversalPriceResult> {
    let prices = PriceLadder::from_retail(assay.retail_price_per_qtl, ladder);

    let tiers = assay
        .tiers
        .iter()
        .map(|t| {
            let price_per_qtl = prices.price_for(t.tier);
            Ok(TierPrice {
                tier: t.tier,
                quantity_kg: t.quantity_kg,
                price_per_qtl,
                value: quintal_value(t.quantity_kg, price_per_qtl)?,
            })
        })
        .collect::<EngineResult<Vec<TierPrice>>>()?;

    let total_value = checked_total(tiers.iter().map(|t| &t.value))?;
    let all_retail = (assay.total_quantity_kg / Decimal::from(KG_PER_QUINTAL))
        .checked_mul(prices.retail_price)
        .ok_or_else(|| {
            EngineError::invalid("total_quantity_kg", "lot value is too large to compute")
        })?;
    let value_saved = tiers
        .iter()
        .find(|t| t.tier == Tier::Industrial)
        .map(|t| t.value)
        .unwrap_or(Decimal::ZERO);

    Ok(UniversalPriceResult {
        crop_key: assay.crop_key.clone(),
        ladder: prices,
        tiers,
        total_value,
        compared_to_all_retail: percent_of(total_value, all_retail),
        value_saved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CropCatalog;
    use crate::models::{scan, FixedSplit, ScanRequest, TierSplit};
    use crate::params::HarvestParams;
    use chrono::Utc;

    fn tomato_assay(split: TierSplit) -> DigitalAssay {
        let catalog = CropCatalog::builtin().unwrap();
        let request = ScanRequest::new("tomato", Decimal::from(1000));
        scan(
            &catalog,
            &FixedSplit(split),
            &request,
            &HarvestParams::default(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_ladder_for_tomato() {
        let ladder = PriceLadder::from_retail(Decimal::from(2500), &PricingLadder::default());
        assert_eq!(ladder.mandi_price, Decimal::from(1750));
        assert_eq!(ladder.factory_price, Decimal::from(750));
        assert!(ladder.is_monotonic());
    }

    #[test]
    fn test_ladder_rounds_half_up() {
        // 15 * 0.3 = 4.5 -> 5, 15 * 0.7 = 10.5 -> 11
        let ladder = PriceLadder::from_retail(Decimal::from(15), &PricingLadder::default());
        assert_eq!(ladder.factory_price, Decimal::from(5));
        assert_eq!(ladder.mandi_price, Decimal::from(11));
    }

    #[test]
    fn test_price_assay_values() {
        let result = price_assay(&tomato_assay(TierSplit::new(40, 30, 30)), &PricingLadder::default()).unwrap();
        assert_eq!(result.total_value, Decimal::from(17500));
        assert_eq!(result.compared_to_all_retail, 70);
        assert_eq!(result.value_saved, Decimal::from(2250));
        assert_eq!(result.tiers.len(), 3);
    }

    #[test]
    fn test_all_retail_is_hundred_percent() {
        let result =
            price_assay(&tomato_assay(TierSplit::new(100, 0, 0)), &PricingLadder::default()).unwrap();
        assert_eq!(result.compared_to_all_retail, 100);
        assert_eq!(result.value_saved, Decimal::ZERO);
    }

    #[test]
    fn test_zero_quantity_guard() {
        let mut assay = tomato_assay(TierSplit::new(40, 30, 30));
        assay.total_quantity_kg = Decimal::ZERO;
        for tier in assay.tiers.iter_mut() {
            tier.quantity_kg = 0;
        }
        let result = price_assay(&assay, &PricingLadder::default()).unwrap();
        assert_eq!(result.compared_to_all_retail, 0);
        assert_eq!(result.total_value, Decimal::ZERO);
    }

    #[test]
    fn test_oversized_assay_is_invalid_input() {
        let mut assay = tomato_assay(TierSplit::new(40, 30, 30));
        assay.total_quantity_kg = Decimal::from(i64::MAX);
        assay.retail_price_per_qtl = Decimal::from(i64::MAX);
        for tier in assay.tiers.iter_mut() {
            tier.quantity_kg = i64::MAX;
        }
        assert!(matches!(
            price_assay(&assay, &PricingLadder::default()),
            Err(EngineError::InvalidInput { .. })
        ));
    }
}
