//! Crop master catalog
//!
//! Holds the immutable crop reference table. Entries are validated when the
//! catalog is built, so a malformed table fails at startup instead of at
//! lookup time.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{normalize_crop_key, CarbonRisk, CropConfig, TransportMode};

/// Read-only table of crop configurations keyed by normalized crop key
#[derive(Debug, Clone)]
pub struct CropCatalog {
    crops: BTreeMap<String, CropConfig>,
}

impl CropCatalog {
    /// Build a catalog from raw entries, normalizing keys and validating each one
    pub fn from_entries(entries: Vec<CropConfig>) -> EngineResult<Self> {
        let mut crops = BTreeMap::new();
        for mut entry in entries {
            entry.key = normalize_crop_key(&entry.key);
            validate_entry(&entry)?;
            if crops.contains_key(&entry.key) {
                return Err(EngineError::InvalidConfig(format!(
                    "duplicate crop key '{}'",
                    entry.key
                )));
            }
            crops.insert(entry.key.clone(), entry);
        }
        if crops.is_empty() {
            return Err(EngineError::InvalidConfig(
                "crop catalog is empty".to_string(),
            ));
        }
        Ok(Self { crops })
    }

    /// Parse a JSON array of crop entries
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let entries: Vec<CropConfig> = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidConfig(format!("crop catalog JSON: {}", e)))?;
        Self::from_entries(entries)
    }

    /// The built-in reference table
    pub fn builtin() -> EngineResult<Self> {
        Self::from_entries(builtin_entries())
    }

    /// Look up a crop by key; the key is normalized first
    pub fn lookup(&self, key: &str) -> EngineResult<&CropConfig> {
        let normalized = normalize_crop_key(key);
        self.crops
            .get(&normalized)
            .ok_or_else(|| EngineError::crop_not_found(normalized))
    }

    /// All crop keys in sorted order
    pub fn list_keys(&self) -> Vec<String> {
        self.crops.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CropConfig> {
        self.crops.values()
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

fn validate_entry(entry: &CropConfig) -> EngineResult<()> {
    let fail = |message: &str| {
        Err(EngineError::InvalidConfig(format!(
            "crop '{}': {}",
            entry.key, message
        )))
    };

    if entry.key.is_empty() {
        return fail("key cannot be empty");
    }
    if entry.name.trim().is_empty() {
        return fail("name cannot be empty");
    }
    if entry.shelf_life_hours == 0 {
        return fail("shelf life must be positive");
    }
    if entry.retail_price_per_qtl <= Decimal::ZERO {
        return fail("retail price must be positive");
    }
    if entry.factory_buyer.trim().is_empty() {
        return fail("factory buyer cannot be empty");
    }
    if entry.rescue_channels.is_empty()
        || entry.rescue_channels.iter().any(|c| c.trim().is_empty())
    {
        return fail("rescue channels must be a non-empty list of names");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn crop(
    key: &str,
    name: &str,
    destinations: [&str; 3],
    transport: TransportMode,
    shelf_life_hours: u32,
    carbon_risk: CarbonRisk,
    retail_price_per_qtl: i64,
    factory_buyer: &str,
    rescue_channels: &[&str],
) -> CropConfig {
    CropConfig {
        key: key.to_string(),
        name: name.to_string(),
        tier1_destination: destinations[0].to_string(),
        tier2_destination: destinations[1].to_string(),
        tier3_destination: destinations[2].to_string(),
        transport,
        shelf_life_hours,
        carbon_risk,
        retail_price_per_qtl: Decimal::from(retail_price_per_qtl),
        factory_buyer: factory_buyer.to_string(),
        rescue_channels: rescue_channels.iter().map(|c| c.to_string()).collect(),
    }
}

fn builtin_entries() -> Vec<CropConfig> {
    vec![
        crop(
            "tomato",
            "Tomato",
            [
                "Supermarket chains / Quick-commerce",
                "Local mandi / Hotels",
                "Ketchup & puree processing",
            ],
            TransportMode::CrateStackable,
            36,
            CarbonRisk::HighMethane,
            2500,
            "Regional Tomato Processing Unit",
            &["NGO community kitchens", "Sauce micro-units", "Composting"],
        ),
        crop(
            "onion",
            "Onion",
            [
                "Export / Modern retail",
                "Wholesale mandi",
                "Dehydration plants",
            ],
            TransportMode::Sack,
            720,
            CarbonRisk::Low,
            1800,
            "Onion Dehydration Plant",
            &["Food banks", "Animal feed", "Composting"],
        ),
        crop(
            "potato",
            "Potato",
            [
                "Chip-grade contracts / Retail",
                "Wholesale mandi",
                "Starch & flakes factory",
            ],
            TransportMode::Sack,
            1440,
            CarbonRisk::Low,
            1500,
            "Starch Processing Factory",
            &["Food banks", "Animal feed", "Biogas digesters"],
        ),
        crop(
            "banana",
            "Banana",
            [
                "Supermarkets / Export",
                "Fruit vendors / Hotels",
                "Banana chips & flour units",
            ],
            TransportMode::VentilatedVan,
            96,
            CarbonRisk::HighMethane,
            3000,
            "Banana Flour Processing Unit",
            &["NGO community kitchens", "Animal feed", "Composting"],
        ),
        crop(
            "mango",
            "Mango",
            [
                "Export / Premium retail",
                "Local mandi / Juice bars",
                "Pulp & pickle factory",
            ],
            TransportMode::PaddedBox,
            120,
            CarbonRisk::Medium,
            6000,
            "Mango Pulp Factory",
            &["NGO community kitchens", "Pickle micro-units", "Composting"],
        ),
        crop(
            "spinach",
            "Spinach",
            [
                "Quick-commerce / Supermarkets",
                "Local mandi / Restaurants",
                "Puree & frozen-food units",
            ],
            TransportMode::Refrigerated,
            24,
            CarbonRisk::HighMethane,
            2000,
            "Frozen Greens Processor",
            &["NGO community kitchens", "Animal feed", "Composting"],
        ),
        crop(
            "cauliflower",
            "Cauliflower",
            [
                "Supermarkets / Quick-commerce",
                "Local mandi / Caterers",
                "Pickle & frozen-food units",
            ],
            TransportMode::OpenCrate,
            48,
            CarbonRisk::Medium,
            1600,
            "Frozen Vegetable Processor",
            &["NGO community kitchens", "Animal feed", "Composting"],
        ),
        crop(
            "grapes",
            "Grapes",
            [
                "Export / Premium retail",
                "Local mandi / Juice bars",
                "Raisin & winery units",
            ],
            TransportMode::Refrigerated,
            72,
            CarbonRisk::Medium,
            5000,
            "Raisin Drying Cooperative",
            &["Food banks", "Vinegar micro-units", "Composting"],
        ),
        crop(
            "strawberry",
            "Strawberry",
            [
                "Premium retail / Quick-commerce",
                "Bakeries / Hotels",
                "Jam & preserve factory",
            ],
            TransportMode::Refrigerated,
            24,
            CarbonRisk::HighMethane,
            12000,
            "Jam & Preserve Factory",
            &["NGO community kitchens", "Dessert micro-units", "Composting"],
        ),
        crop(
            "okra",
            "Okra",
            [
                "Supermarkets / Export",
                "Local mandi / Restaurants",
                "Frozen-food & dehydration units",
            ],
            TransportMode::VentilatedVan,
            36,
            CarbonRisk::Medium,
            2800,
            "Frozen Vegetable Processor",
            &["NGO community kitchens", "Animal feed", "Composting"],
        ),
    ]
}
