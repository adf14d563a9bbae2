//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section falls back to the house rules when omitted, so a
//! partial file (or an empty one) is a valid configuration.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub meeting: MeetingConfig,
    #[serde(default)]
    pub racing: RacingConfig,
    #[serde(default)]
    pub wagering: WageringConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MeetingConfig {
    pub name: String,
    pub venue: String,
}

impl Default for MeetingConfig {
    fn default() -> Self {
        Self {
            name: "Race Day".to_string(),
            venue: "Hipódromo".to_string(),
        }
    }
}

/// Eligibility thresholds and roster bounds.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RacingConfig {
    pub min_participants: usize,
    pub max_participants: usize,
    /// Minimum days between two races of the same horse.
    pub horse_rest_days: i64,
    pub horse_min_age_years: u32,
    pub horse_min_weight: Decimal,
    pub horse_max_weight: Decimal,
    pub jockey_min_age_years: u32,
    pub jockey_min_weight: Decimal,
    pub jockey_max_weight: Decimal,
    pub assigned_min_weight: Decimal,
    pub assigned_max_weight: Decimal,
    /// Max distance between a jockey's own weight and the assigned weight.
    pub weight_tolerance: Decimal,
    /// How far in the past a race date may be and still be run.
    pub stale_race_days: i64,
}

impl Default for RacingConfig {
    fn default() -> Self {
        Self {
            min_participants: 4,
            max_participants: 20,
            horse_rest_days: 7,
            horse_min_age_years: 2,
            horse_min_weight: dec!(300),
            horse_max_weight: dec!(600),
            jockey_min_age_years: 16,
            jockey_min_weight: dec!(50),
            jockey_max_weight: dec!(57),
            assigned_min_weight: dec!(50),
            assigned_max_weight: dec!(65),
            weight_tolerance: dec!(2),
            stale_race_days: 1,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct WageringConfig {
    /// Smallest stake accepted for any wager.
    pub min_stake: Decimal,
    /// Per-wager limit given to newly opened accounts.
    pub default_stake_limit: Decimal,
}

impl Default for WageringConfig {
    fn default() -> Self {
        Self {
            min_stake: dec!(10),
            default_stake_limit: dec!(1000),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub snapshot_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: "turf_book.json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject rule sets the race state machine cannot honour.
    pub fn validate(&self) -> Result<()> {
        let r = &self.racing;
        if r.min_participants == 0 || r.min_participants > r.max_participants {
            anyhow::bail!(
                "racing.min_participants ({}) must be in 1..=max_participants ({})",
                r.min_participants,
                r.max_participants
            );
        }
        if r.assigned_min_weight > r.assigned_max_weight
            || r.jockey_min_weight > r.jockey_max_weight
            || r.horse_min_weight > r.horse_max_weight
        {
            anyhow::bail!("racing weight ranges must have min <= max");
        }
        if self.wagering.min_stake <= Decimal::ZERO {
            anyhow::bail!("wagering.min_stake must be positive");
        }
        Ok(())
    }
}
