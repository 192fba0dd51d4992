//! Configuration management for scout-settle
//!
//! Loads from YAML files + environment variables via .env

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub settlement: SettlementConfig,
    pub logging: LoggingConfig,
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettlementConfig {
    /// Ticker of the staking asset, for display only
    pub asset_symbol: String,
    /// Decimals between the smallest unit and one whole unit (8 for Octas)
    pub unit_decimals: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Data directory (payout sheets go under `payouts/`)
    pub data_dir: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let builder = Self::with_defaults(Config::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (SCOUT__*)
            .add_source(Environment::with_prefix("SCOUT").separator("__"));

        Self::from_config(builder.build().context("Failed to build configuration")?)
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(builder
            .set_default("settlement.asset_symbol", "APT")?
            .set_default("settlement.unit_decimals", 8)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("persistence.data_dir", "./data")?)
    }

    fn from_config(config: Config) -> Result<Self> {
        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.settlement.unit_decimals > 28 {
            bail!(
                "settlement.unit_decimals must be <= 28, got {}",
                self.settlement.unit_decimals
            );
        }
        if self.settlement.asset_symbol.trim().is_empty() {
            bail!("settlement.asset_symbol must not be empty");
        }
        Ok(())
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "asset={} decimals={} log_level={} json={} data_dir={}",
            self.settlement.asset_symbol,
            self.settlement.unit_decimals,
            self.logging.level,
            self.logging.json,
            self.persistence.data_dir
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
