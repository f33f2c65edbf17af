//! Configuration management for the harvest rescue server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with HRE_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::{Factory, HarvestParams, MAX_LOT_KG};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Engine tunables (split ranges, price ladder, thresholds)
    #[serde(default)]
    pub engine: HarvestParams,

    /// Crop catalog source
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Local tier classifier
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Remote AI grading service
    #[serde(default)]
    pub grading: GradingConfig,

    /// Pickup cycle and milk-run settings
    #[serde(default)]
    pub milk_run: MilkRunConfig,

    /// Rescue radar housekeeping
    #[serde(default)]
    pub radar: RadarConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    /// JSON file replacing the built-in crop table
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClassifierConfig {
    /// Fixed RNG seed for reproducible demo scans; random when unset
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GradingConfig {
    /// AI grading endpoint returning tier percentages
    pub api_endpoint: Option<String>,

    /// AI grading API key
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Fail scans instead of falling back to the local classifier
    pub required: bool,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            api_endpoint: None,
            api_key: None,
            timeout_secs: 30,
            required: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MilkRunConfig {
    /// Seconds between pickup cycles
    pub cycle_interval_secs: u64,

    /// Truck capacity used by scheduled cycles
    pub truck_capacity_kg: i64,

    /// Factories receiving industrial-grade produce
    pub factories: Vec<Factory>,
}

impl Default for MilkRunConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: 3600,
            truck_capacity_kg: 500,
            factories: default_factories(),
        }
    }
}

/// One year
const MAX_RETENTION_HOURS: i64 = 24 * 365;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RadarConfig {
    /// Hours a claimed or expired lot stays visible after its shelf life ends
    pub retention_hours: i64,

    /// Seconds between registry sweeps
    pub sweep_interval_secs: u64,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            retention_hours: 24,
            sweep_interval_secs: 600,
        }
    }
}

fn default_factories() -> Vec<Factory> {
    vec![
        Factory {
            id: "nashik-agro".to_string(),
            name: "Nashik Agro Processing Cluster".to_string(),
            location: "Nashik MIDC, Maharashtra".to_string(),
        },
        Factory {
            id: "kolar-foods".to_string(),
            name: "Kolar Food Park".to_string(),
            location: "Kolar, Karnataka".to_string(),
        },
    ]
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("HRE_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (HRE_ prefix)
            .add_source(
                Environment::with_prefix("HRE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Check cross-field settings the deserializer cannot express
    pub fn validate(&self) -> Result<(), String> {
        self.engine.validate().map_err(|e| e.to_string())?;
        if self.milk_run.truck_capacity_kg <= 0 {
            return Err("milk_run.truck_capacity_kg must be positive".to_string());
        }
        if self.milk_run.truck_capacity_kg > MAX_LOT_KG {
            return Err(format!(
                "milk_run.truck_capacity_kg cannot exceed {} kg",
                MAX_LOT_KG
            ));
        }
        if self.milk_run.cycle_interval_secs == 0 {
            return Err("milk_run.cycle_interval_secs must be positive".to_string());
        }
        if self.milk_run.factories.is_empty() {
            return Err("milk_run.factories cannot be empty".to_string());
        }
        if !(0..=MAX_RETENTION_HOURS).contains(&self.radar.retention_hours) {
            return Err(format!(
                "radar.retention_hours must be between 0 and {}",
                MAX_RETENTION_HOURS
            ));
        }
        if self.radar.sweep_interval_secs == 0 {
            return Err("radar.sweep_interval_secs must be positive".to_string());
        }
        if self.grading.required && self.grading.api_endpoint.is_none() {
            return Err("grading.required is set but grading.api_endpoint is missing".to_string());
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            engine: HarvestParams::default(),
            catalog: CatalogConfig::default(),
            classifier: ClassifierConfig::default(),
            grading: GradingConfig::default(),
            milk_run: MilkRunConfig::default(),
            radar: RadarConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_required_grading_without_endpoint_rejected() {
        let mut config = Config::default();
        config.grading.required = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = Config::default();
        config.milk_run.truck_capacity_kg = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_capacity_above_lot_limit_rejected() {
        let mut config = Config::default();
        config.milk_run.truck_capacity_kg = MAX_LOT_KG;
        assert!(config.validate().is_ok());
        config.milk_run.truck_capacity_kg = MAX_LOT_KG + 1;
        let err = config.validate().unwrap_err();
        assert!(err.contains("truck_capacity_kg"));
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let mut config = Config::default();
        config.radar.sweep_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.radar.retention_hours = i64::MAX;
        assert!(config.validate().is_err());
    }
}
