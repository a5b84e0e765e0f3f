use crate::core::currency::{DEFAULT_FROM, DEFAULT_TO};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_EXCHANGE_RATES_URL: &str = "https://api.exchangeratesapi.io";
pub const DEFAULT_BLOCKCHAIN_URL: &str = "https://blockchain.info";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRatesProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BlockchainProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub exchange_rates: Option<ExchangeRatesProviderConfig>,
    pub blockchain: Option<BlockchainProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            exchange_rates: Some(ExchangeRatesProviderConfig {
                base_url: DEFAULT_EXCHANGE_RATES_URL.to_string(),
            }),
            blockchain: Some(BlockchainProviderConfig {
                base_url: DEFAULT_BLOCKCHAIN_URL.to_string(),
            }),
        }
    }
}

impl ProvidersConfig {
    pub fn exchange_rates_url(&self) -> &str {
        self.exchange_rates
            .as_ref()
            .map_or(DEFAULT_EXCHANGE_RATES_URL, |p| &p.base_url)
    }

    pub fn blockchain_url(&self) -> &str {
        self.blockchain
            .as_ref()
            .map_or(DEFAULT_BLOCKCHAIN_URL, |p| &p.base_url)
    }
}

/// Values used when a conversion leaves the amount or a currency unspecified.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversionDefaults {
    #[serde(default = "default_amount")]
    pub amount: f64,
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default = "default_to")]
    pub to: String,
}

fn default_amount() -> f64 {
    1.0
}

fn default_from() -> String {
    DEFAULT_FROM.to_string()
}

fn default_to() -> String {
    DEFAULT_TO.to_string()
}

impl Default for ConversionDefaults {
    fn default() -> Self {
        Self {
            amount: default_amount(),
            from: default_from(),
            to: default_to(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub defaults: ConversionDefaults,
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no file has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "currency", "currency")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
