//! Configuration loading and management
//!
//! The shop configuration is a small YAML document. Every key is optional;
//! anything missing falls back to the documented default, so an empty file
//! (or no file at all) yields a usable configuration.
//!
//! ```yaml
//! database:
//!   url: sqlite://measureon.db
//! pricing:
//!   shirt_price: 450
//!   pant_price: 500
//!   short_price: 400
//! notifications:
//!   enabled: true
//!   ready_template: "Your order #{{ order_number }} is ready for pickup!"
//!   delivered_template: "Your order #{{ order_number }} has been delivered. Thank you!"
//! ```

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding [`DatabaseConfig::url`]
pub const DATABASE_URL_ENV: &str = "MEASUREON_DATABASE_URL";

/// Default shirt price in currency units
pub const DEFAULT_SHIRT_PRICE: f64 = 450.0;
/// Default pant price in currency units
pub const DEFAULT_PANT_PRICE: f64 = 500.0;
/// Default short price in currency units
pub const DEFAULT_SHORT_PRICE: f64 = 400.0;

/// Database connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL (e.g. `sqlite://measureon.db` or `sqlite::memory:`)
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://measureon.db".to_string(),
        }
    }
}

/// Per-garment prices
///
/// Loaded once per session and passed by reference to whatever computes
/// price-derived totals (order quotes, dashboard revenue).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub shirt_price: f64,
    pub pant_price: f64,
    pub short_price: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            shirt_price: DEFAULT_SHIRT_PRICE,
            pant_price: DEFAULT_PANT_PRICE,
            short_price: DEFAULT_SHORT_PRICE,
        }
    }
}

impl PricingConfig {
    /// Price of a garment mix at the current prices
    pub fn quote(&self, shirts: u32, pants: u32, shorts: u32) -> f64 {
        f64::from(shirts) * self.shirt_price
            + f64::from(pants) * self.pant_price
            + f64::from(shorts) * self.short_price
    }

    /// Reject negative or non-finite prices
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("shirt_price", self.shirt_price),
            ("pant_price", self.pant_price),
            ("short_price", self.short_price),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                    message: "price must be a non-negative number".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Customer notification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Send messages on ready/delivered transitions
    pub enabled: bool,

    /// Tera template for the "ready" message (`order_number`, `customer_number` in scope)
    pub ready_template: String,

    /// Tera template for the "delivered" message
    pub delivered_template: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ready_template: "Your order #{{ order_number }} is ready for pickup!".to_string(),
            delivered_template: "Your order #{{ order_number }} has been delivered. Thank you!"
                .to_string(),
        }
    }
}

/// Complete configuration for a shop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub database: DatabaseConfig,
    pub pricing: PricingConfig,
    pub notifications: NotificationConfig,
}

impl ShopConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::parse(&content, Some(path.display().to_string()))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse(yaml, None)
    }

    /// Load the file if it exists, otherwise return the defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_yaml_file(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Write the configuration back as YAML (used by the prices editor)
    pub fn save_yaml_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })?;

        std::fs::write(path, yaml).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Apply `MEASUREON_DATABASE_URL` if set
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.database.url = url;
            }
        }
    }

    fn parse(yaml: &str, file: Option<String>) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file,
            message: e.to_string(),
        })?;
        config.pricing.validate()?;
        Ok(config)
    }
}
