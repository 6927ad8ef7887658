//! Current-price lookup for the close path.
//!
//! The engine does not own a price feed; closes consult whatever source is
//! injected here. The HTTP `allMids` source is the always-available fallback.

use std::future::Future;

use tracing::debug;
use updown_core::{Network, Price};
use updown_exchange::InfoClient;

use crate::error::LifecycleResult;

/// Best-effort price lookup. `None` means unavailable, not zero.
pub trait PriceSource: Send + Sync + 'static {
    fn price(&self, asset: &str) -> impl Future<Output = Option<Price>> + Send;
}

/// Mid prices from the info endpoint.
pub struct HttpPriceSource {
    info: InfoClient,
}

impl HttpPriceSource {
    pub fn new(network: Network) -> LifecycleResult<Self> {
        Ok(Self {
            info: InfoClient::new(network)?,
        })
    }
}

impl PriceSource for HttpPriceSource {
    fn price(&self, asset: &str) -> impl Future<Output = Option<Price>> + Send {
        async move {
            match self.info.fetch_mid(asset).await {
                Ok(price) => price,
                Err(e) => {
                    debug!(asset = %asset, error = %e, "Mid price fetch failed");
                    None
                }
            }
        }
    }
}
