//! Engine configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use updown_core::Network;
use updown_lifecycle::SchedulerConfig;

use crate::error::{EngineError, EngineResult};

/// Top-level engine configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Trade against the testnet deployment. Default: true.
    #[serde(default = "default_use_testnet")]
    pub use_testnet: bool,

    /// Offset for aggressive limit prices (bps). Default: 200 (2%).
    #[serde(default = "default_price_offset_bps")]
    pub price_offset_bps: u32,

    /// Per-step budget for the close path (ms). Default: 10,000.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,

    /// How often the asset registry refreshes metadata (s). Default: 600.
    #[serde(default = "default_meta_refresh_secs")]
    pub meta_refresh_secs: u64,

    /// Margin committed per bet when the caller does not specify one (USD).
    /// Default: 10.
    #[serde(default = "default_margin")]
    pub default_margin: Decimal,

    /// Where delegate keys persist. None keeps them in memory only.
    #[serde(default)]
    pub key_store_path: Option<String>,
}

fn default_use_testnet() -> bool {
    true
}

fn default_price_offset_bps() -> u32 {
    200
}

fn default_close_timeout_ms() -> u64 {
    10_000
}

fn default_meta_refresh_secs() -> u64 {
    600
}

fn default_margin() -> Decimal {
    Decimal::from(10)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            use_testnet: default_use_testnet(),
            price_offset_bps: default_price_offset_bps(),
            close_timeout_ms: default_close_timeout_ms(),
            meta_refresh_secs: default_meta_refresh_secs(),
            default_margin: default_margin(),
            key_store_path: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the file named by `UPDOWN_CONFIG`, falling
    /// back to `config/default.toml`, falling back to defaults.
    pub fn load() -> EngineResult<Self> {
        let config_path =
            std::env::var("UPDOWN_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {e}")))
    }

    pub fn network(&self) -> Network {
        Network::from_testnet_flag(self.use_testnet)
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            price_offset_bps: self.price_offset_bps,
            close_timeout_ms: self.close_timeout_ms,
            ..SchedulerConfig::default()
        }
    }
}
