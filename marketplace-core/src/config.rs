//! Configuration for the marketplace engine

use crate::types::Principal;
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Actor mailbox capacity (bounded for backpressure)
    pub mailbox_capacity: usize,

    /// Genesis configuration
    pub genesis: GenesisConfig,

    /// Field validation limits
    pub limits: LimitsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "marketplace-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            mailbox_capacity: 1000,
            genesis: GenesisConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Genesis configuration
///
/// The genesis administrator plays the deployer role: it is seeded into the
/// administrator set when the engine opens, so the set is never empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// First administrator
    pub administrator: Principal,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            administrator: Principal::new("genesis-administrator"),
        }
    }
}

/// Field validation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum store/item name length (bytes)
    pub max_name_len: usize,

    /// Maximum item description length (bytes)
    pub max_description_len: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_name_len: 128,
            max_description_len: 1024,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load defaults with environment variable overrides
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(admin) = std::env::var("MARKETPLACE_GENESIS_ADMIN") {
            config.genesis.administrator = Principal::new(admin);
        }

        if let Ok(capacity) = std::env::var("MARKETPLACE_MAILBOX_CAPACITY") {
            config.mailbox_capacity = capacity
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid mailbox capacity: {}", e)))?;
        }

        Ok(config)
    }
}
