//! Main application configuration
//!
//! This module defines the configuration structures for the skill ledger,
//! including TOML file loading, environment variable overrides and validation.

use crate::config::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub storage: StorageSettings,
    pub rating: RatingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// JSON snapshot holding users, matches and the rating timeline
    pub snapshot_path: PathBuf,
    /// Rebuild the timeline from match history after loading a snapshot
    pub recompute_on_load: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "skill-ledger".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("skill-ledger.json"),
            recompute_on_load: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Storage settings
        if let Ok(path) = env::var("SNAPSHOT_PATH") {
            self.storage.snapshot_path = PathBuf::from(path);
        }
        if let Ok(recompute) = env::var("RECOMPUTE_ON_LOAD") {
            self.storage.recompute_on_load = recompute
                .parse()
                .map_err(|_| anyhow!("Invalid RECOMPUTE_ON_LOAD value: {}", recompute))?;
        }

        // Rating settings
        if let Ok(elo) = env::var("SEED_ELO") {
            self.rating.seed_elo = elo
                .parse()
                .map_err(|_| anyhow!("Invalid SEED_ELO value: {}", elo))?;
        }
        if let Ok(mean) = env::var("SEED_TRUESKILL_MEAN") {
            self.rating.seed_trueskill_mean = mean
                .parse()
                .map_err(|_| anyhow!("Invalid SEED_TRUESKILL_MEAN value: {}", mean))?;
        }
        if let Ok(deviation) = env::var("SEED_TRUESKILL_DEVIATION") {
            self.rating.seed_trueskill_deviation = deviation.parse().map_err(|_| {
                anyhow!("Invalid SEED_TRUESKILL_DEVIATION value: {}", deviation)
            })?;
        }
        if let Ok(beta) = env::var("TRUESKILL_BETA") {
            self.rating.trueskill_beta = beta
                .parse()
                .map_err(|_| anyhow!("Invalid TRUESKILL_BETA value: {}", beta))?;
        }
        if let Ok(dynamics) = env::var("TRUESKILL_DYNAMICS") {
            self.rating.trueskill_dynamics = dynamics
                .parse()
                .map_err(|_| anyhow!("Invalid TRUESKILL_DYNAMICS value: {}", dynamics))?;
        }
        if let Ok(draw) = env::var("TRUESKILL_DRAW_PROBABILITY") {
            self.rating.trueskill_draw_probability = draw
                .parse()
                .map_err(|_| anyhow!("Invalid TRUESKILL_DRAW_PROBABILITY value: {}", draw))?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    if config.storage.snapshot_path.as_os_str().is_empty() {
        return Err(anyhow!("Snapshot path cannot be empty"));
    }

    config.rating.validate()?;

    Ok(())
}
