//! Refreshable cache of per-asset reference data.
//!
//! Sizing and leverage-setting both need `AssetConfig`; nothing is submitted
//! for an asset the registry does not know.

use dashmap::DashMap;
use tracing::info;
use updown_core::{AssetConfig, CoreError, Network};

use crate::error::EngineResult;

pub struct AssetRegistry {
    info: updown_exchange::InfoClient,
    assets: DashMap<String, AssetConfig>,
}

impl AssetRegistry {
    pub fn new(network: Network) -> EngineResult<Self> {
        Ok(Self {
            info: updown_exchange::InfoClient::new(network)?,
            assets: DashMap::new(),
        })
    }

    /// Re-fetch metadata and replace the cache. Returns the asset count.
    pub async fn refresh(&self) -> EngineResult<usize> {
        let fetched = self.info.fetch_meta().await?;
        self.replace_all(fetched);
        info!(asset_count = self.assets.len(), "Asset registry refreshed");
        Ok(self.assets.len())
    }

    /// Refresh only when the cache is empty (first use).
    pub async fn ensure_loaded(&self) -> EngineResult<()> {
        if self.assets.is_empty() {
            self.refresh().await?;
        }
        Ok(())
    }

    /// Look up an asset; unknown symbols fail fast.
    pub fn get(&self, asset: &str) -> EngineResult<AssetConfig> {
        self.assets
            .get(asset)
            .map(|entry| entry.clone())
            .ok_or_else(|| CoreError::UnknownAsset(asset.to_string()).into())
    }

    pub fn replace_all(&self, configs: Vec<AssetConfig>) {
        self.assets.clear();
        for config in configs {
            self.assets.insert(config.name.clone(), config);
        }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    fn registry_with(configs: Vec<AssetConfig>) -> AssetRegistry {
        let registry = AssetRegistry::new(Network::Testnet).unwrap();
        registry.replace_all(configs);
        registry
    }

    fn btc() -> AssetConfig {
        AssetConfig {
            name: "BTC".to_string(),
            asset_index: 0,
            sz_decimals: 5,
            max_leverage: 40,
        }
    }

    #[test]
    fn test_lookup_known_asset() {
        let registry = registry_with(vec![btc()]);
        let config = registry.get("BTC").unwrap();
        assert_eq!(config.asset_index, 0);
        assert_eq!(config.max_leverage, 40);
    }

    #[test]
    fn test_unknown_asset_fails_fast() {
        let registry = registry_with(vec![btc()]);
        assert!(matches!(
            registry.get("NOPE"),
            Err(EngineError::UnknownAsset(_))
        ));
    }

    #[test]
    fn test_replace_all_drops_stale_entries() {
        let registry = registry_with(vec![btc()]);
        registry.replace_all(vec![AssetConfig {
            name: "ETH".to_string(),
            asset_index: 1,
            sz_decimals: 4,
            max_leverage: 25,
        }]);

        assert_eq!(registry.len(), 1);
        assert!(registry.get("BTC").is_err());
        assert!(registry.get("ETH").is_ok());
    }
}
