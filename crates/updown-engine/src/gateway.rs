//! Submission seam between the trade service and the exchange.
//!
//! The service's ordering rules (leverage acknowledged before the open
//! order goes out) live above this trait; everything below it is signing
//! and transport.

use std::future::Future;

use alloy::signers::local::PrivateKeySigner;
use tracing::debug;
use updown_core::Network;
use updown_exchange::{ActionEnvelope, ExchangeClient, OrderStatus};
use updown_signing::{
    sign_action, NonceSource, OrderAction, SignatureWire, SystemClock, UpdateLeverageAction,
};

use crate::error::EngineResult;

/// Order-path exchange operations. Abstracted so the placement flow can be
/// driven in tests without a network.
pub trait OrderGateway: Send + Sync + 'static {
    /// Set isolated leverage for an asset and wait for the acknowledgement.
    fn set_leverage(
        &self,
        asset_index: u32,
        leverage: u32,
    ) -> impl Future<Output = EngineResult<()>> + Send;

    /// Sign and submit an opening order, returning the exchange's verdict.
    fn submit_order(
        &self,
        action: OrderAction,
    ) -> impl Future<Output = EngineResult<OrderStatus>> + Send;
}

/// Production gateway: delegate-signed actions over the trade endpoint.
pub struct LiveOrderGateway {
    exchange: ExchangeClient,
    signer: PrivateKeySigner,
    nonces: NonceSource<SystemClock>,
    is_mainnet: bool,
}

impl LiveOrderGateway {
    pub fn new(network: Network, signer: PrivateKeySigner) -> EngineResult<Self> {
        Ok(Self {
            exchange: ExchangeClient::new(network)?,
            signer,
            nonces: NonceSource::with_system_clock(),
            is_mainnet: network.is_mainnet(),
        })
    }

    async fn sign(&self, action: &impl serde::Serialize, nonce: u64) -> EngineResult<SignatureWire> {
        let signature = sign_action(action, nonce, None, self.is_mainnet, &self.signer).await?;
        Ok(SignatureWire::from(&signature))
    }
}

impl OrderGateway for LiveOrderGateway {
    fn set_leverage(
        &self,
        asset_index: u32,
        leverage: u32,
    ) -> impl Future<Output = EngineResult<()>> + Send {
        async move {
            let action = UpdateLeverageAction::new(asset_index, leverage, false);
            let nonce = self.nonces.next();
            let envelope = ActionEnvelope::new(&action, nonce, self.sign(&action, nonce).await?)?;

            self.exchange.submit_action(&envelope).await?;
            debug!(asset_index, leverage, "Leverage set acknowledged");
            Ok(())
        }
    }

    fn submit_order(
        &self,
        action: OrderAction,
    ) -> impl Future<Output = EngineResult<OrderStatus>> + Send {
        async move {
            let nonce = self.nonces.next();
            let envelope = ActionEnvelope::new(&action, nonce, self.sign(&action, nonce).await?)?;
            Ok(self.exchange.submit_order(&envelope).await?)
        }
    }
}
