//! Digital assay models: the three-way tier breakdown of one harvest scan

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::crop::{CarbonRisk, TransportMode};

/// Quality/destination tier of a harvest portion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    /// Retail grade: supermarkets, export, quick-commerce
    Retail,
    /// Market grade: local wholesale and food service
    Market,
    /// Industrial grade: processing factories
    Industrial,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Retail, Tier::Market, Tier::Industrial];

    pub fn number(&self) -> u8 {
        match self {
            Tier::Retail => 1,
            Tier::Market => 2,
            Tier::Industrial => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Retail => "Retail Grade",
            Tier::Market => "Market Grade",
            Tier::Industrial => "Industrial Grade",
        }
    }

    fn index(&self) -> usize {
        usize::from(self.number() - 1)
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.number()
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::Retail),
            2 => Ok(Tier::Market),
            3 => Ok(Tier::Industrial),
            other => Err(format!("tier must be 1, 2 or 3, got {}", other)),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tier {} ({})", self.number(), self.label())
    }
}

/// Percentages of a lot assigned to each tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierSplit {
    pub tier1_percent: i32,
    pub tier2_percent: i32,
    pub tier3_percent: i32,
}

impl TierSplit {
    pub fn new(tier1_percent: i32, tier2_percent: i32, tier3_percent: i32) -> Self {
        Self {
            tier1_percent,
            tier2_percent,
            tier3_percent,
        }
    }

    /// Complete a split from the first two tiers.
    ///
    /// Tier 3 takes the remainder; if that would be negative it is clamped to
    /// zero and tier 2 absorbs the difference, so the result always sums to 100.
    pub fn from_leading(tier1_percent: i32, tier2_percent: i32) -> Self {
        let tier3 = 100i32
            .saturating_sub(tier1_percent)
            .saturating_sub(tier2_percent);
        if tier3 < 0 {
            Self::new(tier1_percent, 100i32.saturating_sub(tier1_percent), 0)
        } else {
            Self::new(tier1_percent, tier2_percent, tier3)
        }
    }

    pub fn percent(&self, tier: Tier) -> i32 {
        match tier {
            Tier::Retail => self.tier1_percent,
            Tier::Market => self.tier2_percent,
            Tier::Industrial => self.tier3_percent,
        }
    }

    /// Sum of the three percentages, widened so any input adds without overflow
    pub fn total(&self) -> i64 {
        i64::from(self.tier1_percent) + i64::from(self.tier2_percent) + i64::from(self.tier3_percent)
    }
}

/// Where the tier split of an assay came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SplitSource {
    /// Caller-supplied percentages (manual entry, demo control, remote grading)
    Override,
    /// Produced by the configured grading strategy
    Strategy,
}

/// One tier of an assay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierBreakdown {
    pub tier: Tier,
    pub label: String,
    pub percentage: i32,
    pub quantity_kg: i64,
    pub destination: String,
    pub price_per_qtl: Decimal,
    /// round(quantity_kg / 100 * price_per_qtl)
    pub total_value: Decimal,
}

/// Computed tier breakdown of one harvest scan; read-only once created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DigitalAssay {
    pub crop_key: String,
    pub crop_name: String,
    pub total_quantity_kg: Decimal,
    pub scanned_at: DateTime<Utc>,
    pub tiers: [TierBreakdown; 3],
    pub total_value: Decimal,
    pub retail_price_per_qtl: Decimal,
    pub factory_buyer: String,
    pub transport: TransportMode,
    pub carbon_risk: CarbonRisk,
    pub shelf_life_hours: u32,
    pub is_perishable: bool,
    pub rescue_eligible: bool,
    pub split_source: SplitSource,
}

impl DigitalAssay {
    pub fn tier(&self, tier: Tier) -> &TierBreakdown {
        &self.tiers[tier.index()]
    }

    pub fn percentage_total(&self) -> i64 {
        self.tiers.iter().map(|t| i64::from(t.percentage)).sum()
    }

    /// Saturates rather than wrapping on a deserialized assay with absurd quantities
    pub fn quantity_total_kg(&self) -> i64 {
        self.tiers
            .iter()
            .fold(0i64, |acc, t| acc.saturating_add(t.quantity_kg))
    }
}
