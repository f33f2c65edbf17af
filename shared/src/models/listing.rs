//! Split-stream listing generator

use std::sync::atomic::{AtomicU64, Ordering};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::assay::{DigitalAssay, Tier};
use super::crop::{CarbonRisk, TransportMode};

/// Buyer channel shown on retail-grade listings
pub const RETAIL_BUYER_LABEL: &str = "Supermarkets, exporters & quick-commerce";
/// Buyer channel shown on market-grade listings
pub const MARKET_BUYER_LABEL: &str = "Local mandi wholesalers, hotels & restaurants";

/// How quickly a listing needs a buyer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    Normal,
    High,
    FlashSale,
}

impl Urgency {
    pub fn for_tier(tier: Tier, is_perishable: bool) -> Self {
        match (tier, is_perishable) {
            (Tier::Industrial, true) => Urgency::FlashSale,
            (Tier::Industrial, false) => Urgency::High,
            _ => Urgency::Normal,
        }
    }
}

/// Independent sellable listing derived from one assay tier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SplitListing {
    pub id: String,
    pub tier: Tier,
    pub crop_name: String,
    pub quantity_kg: i64,
    pub destination: String,
    pub buyer_label: String,
    pub price_per_qtl: Decimal,
    pub total_value: Decimal,
    pub urgency: Urgency,
    pub transport: TransportMode,
    pub carbon_risk: CarbonRisk,
}

/// Monotonic counter making listing ids unique within a process
#[derive(Debug, Default)]
pub struct ListingSequence(AtomicU64);

impl ListingSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(next: u64) -> Self {
        Self(AtomicU64::new(next))
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

fn buyer_label(assay: &DigitalAssay, tier: Tier) -> String {
    match tier {
        Tier::Retail => RETAIL_BUYER_LABEL.to_string(),
        Tier::Market => MARKET_BUYER_LABEL.to_string(),
        Tier::Industrial => assay.factory_buyer.clone(),
    }
}

/// One listing per tier with a non-zero quantity, in tier order
pub fn generate_listings(assay: &DigitalAssay, sequence: &ListingSequence) -> Vec<SplitListing> {
    let scan_millis = assay.scanned_at.timestamp_millis();
    assay
        .tiers
        .iter()
        .filter(|t| t.quantity_kg > 0)
        .map(|t| SplitListing {
            id: format!(
                "{}-{}-t{}-{:06}",
                assay.crop_key,
                scan_millis,
                t.tier.number(),
                sequence.next()
            ),
            tier: t.tier,
            crop_name: assay.crop_name.clone(),
            quantity_kg: t.quantity_kg,
            destination: t.destination.clone(),
            buyer_label: buyer_label(assay, t.tier),
            price_per_qtl: t.price_per_qtl,
            total_value: t.total_value,
            urgency: Urgency::for_tier(t.tier, assay.is_perishable),
            transport: assay.transport,
            carbon_risk: assay.carbon_risk,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CropCatalog;
    use crate::models::{scan, FixedSplit, ScanRequest, TierSplit};
    use crate::params::HarvestParams;
    use chrono::Utc;
    use std::collections::HashSet;

    fn assay_for(crop: &str, split: TierSplit) -> DigitalAssay {
        let catalog = CropCatalog::builtin().unwrap();
        scan(
            &catalog,
            &FixedSplit(split),
            &ScanRequest::new(crop, Decimal::from(1000)),
            &HarvestParams::default(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_urgency_rule() {
        assert_eq!(Urgency::for_tier(Tier::Industrial, true), Urgency::FlashSale);
        assert_eq!(Urgency::for_tier(Tier::Industrial, false), Urgency::High);
        assert_eq!(Urgency::for_tier(Tier::Retail, true), Urgency::Normal);
        assert_eq!(Urgency::for_tier(Tier::Market, false), Urgency::Normal);
    }

    #[test]
    fn test_perishable_listings() {
        let assay = assay_for("tomato", TierSplit::new(40, 30, 30));
        let listings = generate_listings(&assay, &ListingSequence::new());
        assert_eq!(listings.len(), 3);
        assert_eq!(listings[2].urgency, Urgency::FlashSale);
        assert_eq!(listings[2].buyer_label, "Regional Tomato Processing Unit");
        assert_eq!(listings[0].buyer_label, RETAIL_BUYER_LABEL);
        assert_eq!(listings[1].buyer_label, MARKET_BUYER_LABEL);
    }

    #[test]
    fn test_zero_tiers_skipped() {
        let assay = assay_for("onion", TierSplit::new(70, 30, 0));
        let listings = generate_listings(&assay, &ListingSequence::new());
        assert_eq!(listings.len(), 2);
        assert!(listings.iter().all(|l| l.tier != Tier::Industrial));
    }

    #[test]
    fn test_non_perishable_industrial_is_high() {
        let assay = assay_for("potato", TierSplit::new(50, 25, 25));
        let listings = generate_listings(&assay, &ListingSequence::new());
        assert_eq!(listings.last().unwrap().urgency, Urgency::High);
    }

    #[test]
    fn test_ids_unique_for_same_instant() {
        let assay = assay_for("tomato", TierSplit::new(40, 30, 30));
        let sequence = ListingSequence::new();
        let mut ids = HashSet::new();
        for _ in 0..10 {
            for listing in generate_listings(&assay, &sequence) {
                assert!(ids.insert(listing.id));
            }
        }
        assert_eq!(ids.len(), 30);
    }
}
