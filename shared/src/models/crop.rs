//! Crop master reference data

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// How a crop travels from farm to buyer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TransportMode {
    Refrigerated,
    CrateStackable,
    Sack,
    PaddedBox,
    OpenCrate,
    VentilatedVan,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Refrigerated => "refrigerated",
            TransportMode::CrateStackable => "crate-stackable",
            TransportMode::Sack => "sack",
            TransportMode::PaddedBox => "padded-box",
            TransportMode::OpenCrate => "open-crate",
            TransportMode::VentilatedVan => "ventilated-van",
        }
    }

    pub fn is_refrigerated(&self) -> bool {
        matches!(self, TransportMode::Refrigerated)
    }
}

impl std::str::FromStr for TransportMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "refrigerated" => Ok(TransportMode::Refrigerated),
            "crate-stackable" => Ok(TransportMode::CrateStackable),
            "sack" => Ok(TransportMode::Sack),
            "padded-box" => Ok(TransportMode::PaddedBox),
            "open-crate" => Ok(TransportMode::OpenCrate),
            "ventilated-van" => Ok(TransportMode::VentilatedVan),
            _ => Err(EngineError::invalid(
                "transport_method",
                format!("unknown transport method: {}", s),
            )),
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportMode::Refrigerated => write!(f, "Refrigerated Truck"),
            TransportMode::CrateStackable => write!(f, "Stackable Crates"),
            TransportMode::Sack => write!(f, "Jute Sacks"),
            TransportMode::PaddedBox => write!(f, "Padded Boxes"),
            TransportMode::OpenCrate => write!(f, "Open Crates"),
            TransportMode::VentilatedVan => write!(f, "Ventilated Van"),
        }
    }
}

/// Emission risk of a crop's waste stream if it is left to rot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CarbonRisk {
    Low,
    Medium,
    HighMethane,
}

/// Static per-crop reference data, loaded once and never mutated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropConfig {
    /// Normalized lookup key (lowercase, trimmed)
    pub key: String,
    pub name: String,
    pub tier1_destination: String,
    pub tier2_destination: String,
    pub tier3_destination: String,
    pub transport: TransportMode,
    pub shelf_life_hours: u32,
    pub carbon_risk: CarbonRisk,
    /// Retail price in currency per quintal (100 kg)
    pub retail_price_per_qtl: Decimal,
    pub factory_buyer: String,
    pub rescue_channels: Vec<String>,
}

impl CropConfig {
    /// Whether the crop spoils before the given cutoff
    pub fn is_perishable(&self, perishable_below_hours: f64) -> bool {
        f64::from(self.shelf_life_hours) < perishable_below_hours
    }
}

/// Normalize a crop key for lookup
pub fn normalize_crop_key(key: &str) -> String {
    key.trim().to_lowercase()
}
