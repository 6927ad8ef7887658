//! Close-order construction and submission.
//!
//! Closing is the mirror of opening: a reduce-only immediate-or-cancel order
//! on the opposite side, priced through the book so it executes against
//! whatever liquidity is there.

use std::future::Future;

use alloy::signers::local::PrivateKeySigner;
use updown_core::{
    aggressive_limit, position_size, AssetConfig, ClientOrderId, Direction, Network, Position,
    Price, Size,
};
use updown_exchange::{ActionEnvelope, ExchangeClient, OrderStatus};
use updown_signing::{sign_action, NonceSource, OrderAction, OrderWire, SignatureWire, SystemClock};

use crate::error::LifecycleResult;
use crate::price_source::{HttpPriceSource, PriceSource};

/// Everything needed to submit one reduce-only close.
#[derive(Debug, Clone)]
pub struct CloseOrder {
    pub config: AssetConfig,
    /// Closing side: opposite of the position's direction.
    pub direction: Direction,
    pub limit_px: Price,
    pub sz: Size,
    /// Fresh cloid for the close order; never reuses the open cloid.
    pub cloid: ClientOrderId,
}

/// Build the close order for a position.
///
/// The size is the actual fill size; if the open never reported one (for
/// example a resting open), it is recomputed from the committed margin and
/// leverage at the reference price.
pub fn build_close_order(
    position: &Position,
    config: &AssetConfig,
    reference_price: Price,
    offset_bps: u32,
) -> CloseOrder {
    let direction = position.direction.opposite();

    let sz = if position.size.is_positive() {
        config.truncate_size(position.size)
    } else {
        position_size(config, position.margin, position.leverage, reference_price)
            .unwrap_or(Size::ZERO)
    };

    CloseOrder {
        config: config.clone(),
        direction,
        limit_px: aggressive_limit(reference_price, direction.is_buy(), offset_bps),
        sz,
        cloid: ClientOrderId::new(),
    }
}

/// Executes closes against an exchange. Abstracted so the scheduler can be
/// driven in tests without a network.
pub trait CloseExecutor: Send + Sync + 'static {
    /// Best-effort current market price; `None` when unavailable.
    fn market_price(&self, asset: &str) -> impl Future<Output = Option<Price>> + Send;

    /// Sign and submit a reduce-only IOC close.
    fn submit_close(&self, order: CloseOrder)
        -> impl Future<Output = LifecycleResult<OrderStatus>> + Send;
}

/// Production executor: consults the injected price source and submits
/// delegate-signed closes to the trade endpoint.
pub struct LiveCloseExecutor<P: PriceSource = HttpPriceSource> {
    prices: P,
    exchange: ExchangeClient,
    signer: PrivateKeySigner,
    nonces: NonceSource<SystemClock>,
    is_mainnet: bool,
}

impl LiveCloseExecutor<HttpPriceSource> {
    pub fn new(network: Network, signer: PrivateKeySigner) -> LifecycleResult<Self> {
        Self::with_price_source(network, signer, HttpPriceSource::new(network)?)
    }
}

impl<P: PriceSource> LiveCloseExecutor<P> {
    pub fn with_price_source(
        network: Network,
        signer: PrivateKeySigner,
        prices: P,
    ) -> LifecycleResult<Self> {
        Ok(Self {
            prices,
            exchange: ExchangeClient::new(network)?,
            signer,
            nonces: NonceSource::with_system_clock(),
            is_mainnet: network.is_mainnet(),
        })
    }
}

impl<P: PriceSource> CloseExecutor for LiveCloseExecutor<P> {
    fn market_price(&self, asset: &str) -> impl Future<Output = Option<Price>> + Send {
        self.prices.price(asset)
    }

    fn submit_close(
        &self,
        order: CloseOrder,
    ) -> impl Future<Output = LifecycleResult<OrderStatus>> + Send {
        async move {
            let wire = OrderWire::ioc(
                &order.config,
                order.direction,
                order.limit_px,
                order.sz,
                true,
                &order.cloid,
            );
            let action = OrderAction::single(wire);

            let nonce = self.nonces.next();
            let signature =
                sign_action(&action, nonce, None, self.is_mainnet, &self.signer).await?;
            let envelope = ActionEnvelope::new(&action, nonce, SignatureWire::from(&signature))?;

            Ok(self.exchange.submit_order(&envelope).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use updown_core::TradeResult;

    fn eth() -> AssetConfig {
        AssetConfig {
            name: "ETH".to_string(),
            asset_index: 1,
            sz_decimals: 4,
            max_leverage: 25,
        }
    }

    fn open_position(direction: Direction, size: Size) -> Position {
        Position {
            cloid: ClientOrderId::new(),
            oid: Some(1),
            asset: "ETH".to_string(),
            direction,
            entry_price: Price::new(dec!(3000)),
            size,
            margin: dec!(10),
            leverage: 30,
            filled: true,
            opened_at_ms: 1_700_000_000_000,
            duration_ms: 30_000,
            closed: false,
            exit_price: None,
            result: None,
            pnl: None,
        }
    }

    #[test]
    fn test_close_is_opposite_side_and_aggressive() {
        let position = open_position(Direction::Up, Size::new(dec!(0.1)));
        let order = build_close_order(&position, &eth(), Price::new(dec!(3000)), 200);

        // Closing a long sells below the market.
        assert_eq!(order.direction, Direction::Down);
        assert_eq!(order.limit_px, Price::new(dec!(2940)));
        assert_eq!(order.sz, Size::new(dec!(0.1)));

        let position = open_position(Direction::Down, Size::new(dec!(0.1)));
        let order = build_close_order(&position, &eth(), Price::new(dec!(3000)), 200);
        assert_eq!(order.direction, Direction::Up);
        assert_eq!(order.limit_px, Price::new(dec!(3060)));
    }

    #[test]
    fn test_close_cloid_is_fresh() {
        let position = open_position(Direction::Up, Size::new(dec!(0.1)));
        let order = build_close_order(&position, &eth(), Price::new(dec!(3000)), 200);
        assert_ne!(order.cloid, position.cloid);
    }

    #[test]
    fn test_size_fallback_when_fill_size_missing() {
        let position = open_position(Direction::Up, Size::ZERO);
        let order = build_close_order(&position, &eth(), Price::new(dec!(3000)), 200);

        // 10 * 30 / 3000 = 0.1
        assert_eq!(order.sz, Size::new(dec!(0.1)));
    }

    #[test]
    fn test_settlement_result_from_fill() {
        let position = open_position(Direction::Down, Size::new(dec!(0.1)));
        let result = TradeResult::from_prices(
            position.direction,
            position.entry_price,
            Price::new(dec!(2900)),
        );
        assert_eq!(result, TradeResult::Win);
    }
}
