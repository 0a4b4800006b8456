//! # Engine Configuration
//!
//! Tunables for offer ingestion and evaluation.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PREVENTA_DEFAULT_PRIORITY=5                                        │
//! │     PREVENTA_STACKABLE_DEFAULT=true                                    │
//! │     PREVENTA_TIERS_FORCE_PER_LINE=false                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/preventa-promo/promo.toml (Linux)                        │
//! │     ~/Library/Application Support/com.preventa.promo/promo.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [offers]
//! default_priority = 5
//! stackable_default = true
//! extra_excluded_statuses = ["suspendida"]
//!
//! [discount]
//! tiers_force_per_line = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{PromoError, PromoResult};

// =============================================================================
// Offer Settings
// =============================================================================

/// Defaults applied while normalizing offer records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferSettings {
    /// Priority given to records that carry none.
    #[serde(default = "default_priority")]
    pub default_priority: i32,

    /// Value of `stackableWithSameProduct` when a record omits it.
    ///
    /// Records authored before the flag existed were always combinable.
    #[serde(default = "default_true")]
    pub stackable_default: bool,

    /// Additional status words (beyond inactive/draft/closed/expired) that
    /// take an offer out of evaluation. Compared after normalization.
    #[serde(default)]
    pub extra_excluded_statuses: Vec<String>,
}

fn default_priority() -> i32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for OfferSettings {
    fn default() -> Self {
        OfferSettings {
            default_priority: default_priority(),
            stackable_default: true,
            extra_excluded_statuses: Vec::new(),
        }
    }
}

// =============================================================================
// Discount Settings
// =============================================================================

/// Discount evaluation settings.
///
/// ## Tier Evaluation Mode
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  tiers_force_per_line = false (default)                                │
/// │  ───────────────────────────────────────                               │
/// │  per_line = false → one tier picked for the POOLED quantity            │
/// │  per_line = true  → each line picks its own tier                       │
/// │                                                                         │
/// │  tiers_force_per_line = true                                           │
/// │  ───────────────────────────                                           │
/// │  any offer with tiers is evaluated per line, whatever per_line says    │
/// │                                                                         │
/// │  Example: lines of 6 and 6, tier from 12 → 10%                         │
/// │    default: pooled 12 → both lines 10% off                             │
/// │    forced:  6 and 6 match no tier → no discount                        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscountSettings {
    #[serde(default)]
    pub tiers_force_per_line: bool,
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub offers: OfferSettings,

    #[serde(default)]
    pub discount: DiscountSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (promo.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> PromoResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> PromoResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| PromoError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> PromoResult<()> {
        if !(0..=100).contains(&self.offers.default_priority) {
            return Err(PromoError::InvalidConfig(format!(
                "default_priority must be between 0 and 100, got {}",
                self.offers.default_priority
            )));
        }

        if self
            .offers
            .extra_excluded_statuses
            .iter()
            .any(|s| s.trim().is_empty())
        {
            return Err(PromoError::InvalidConfig(
                "extra_excluded_statuses must not contain empty entries".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(priority) = std::env::var("PREVENTA_DEFAULT_PRIORITY") {
            match priority.parse::<i32>() {
                Ok(p) => {
                    debug!(priority = p, "Overriding default priority from environment");
                    self.offers.default_priority = p;
                }
                Err(_) => warn!(value = %priority, "Ignoring non-numeric PREVENTA_DEFAULT_PRIORITY"),
            }
        }

        if let Ok(value) = std::env::var("PREVENTA_STACKABLE_DEFAULT") {
            match parse_flag(&value) {
                Some(flag) => self.offers.stackable_default = flag,
                None => warn!(value = %value, "Ignoring invalid PREVENTA_STACKABLE_DEFAULT"),
            }
        }

        if let Ok(value) = std::env::var("PREVENTA_TIERS_FORCE_PER_LINE") {
            match parse_flag(&value) {
                Some(flag) => {
                    debug!(flag, "Overriding tier evaluation mode from environment");
                    self.discount.tiers_force_per_line = flag;
                }
                None => warn!(value = %value, "Ignoring invalid PREVENTA_TIERS_FORCE_PER_LINE"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "preventa", "promo")
            .map(|dirs| dirs.config_dir().join("promo.toml"))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "si" | "sí" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
