//! The order execution service.
//!
//! `TradeService` is the engine's public surface: it sizes and submits
//! delegate-signed orders, hands every opened position to the lifecycle
//! scheduler, and surfaces settled outcomes through a single callback.
//!
//! Ordering invariant: leverage is set and acknowledged on the exchange
//! before the opening order is submitted. The exchange applies leverage at
//! fill time, so reversing the two would fill at whatever leverage the
//! account happened to have.

use std::sync::Arc;
use std::time::Duration;

use alloy::signers::local::PrivateKeySigner;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use updown_agent::{
    AgentIdentity, DelegationManager, FileKeyStore, InMemoryKeyStore, KeyStore,
};
use updown_core::{
    aggressive_limit, position_size, ClientOrderId, Network, OrderRequest, Position, Price, Size,
};
use updown_exchange::{InfoClient, OrderStatus};
use updown_lifecycle::{LiveCloseExecutor, PositionScheduler};
use updown_signing::{OrderAction, OrderWire};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::gateway::{LiveOrderGateway, OrderGateway};
use crate::registry::AssetRegistry;

/// Build a `Position` record for a submitted open order.
///
/// Filled opens use the exchange's actual fill price and size; a resting
/// open (IOC should not rest, but the reply shape allows it) falls back to
/// the requested values until the exchange reports otherwise.
#[allow(clippy::too_many_arguments)]
fn build_position(
    request: &OrderRequest,
    cloid: ClientOrderId,
    oid: Option<u64>,
    entry_price: Price,
    size: Size,
    margin: Decimal,
    leverage: u32,
    filled: bool,
    opened_at_ms: u64,
) -> Position {
    Position {
        cloid,
        oid,
        asset: request.asset.clone(),
        direction: request.direction,
        entry_price,
        size,
        margin,
        leverage,
        filled,
        opened_at_ms,
        duration_ms: request.duration_ms,
        closed: false,
        exit_price: None,
        result: None,
        pnl: None,
    }
}

pub struct TradeService<G: OrderGateway = LiveOrderGateway> {
    config: EngineConfig,
    network: Network,
    registry: Arc<AssetRegistry>,
    info: InfoClient,
    gateway: G,
    signer: PrivateKeySigner,
    scheduler: Arc<PositionScheduler<LiveCloseExecutor>>,
    results_rx: Option<mpsc::Receiver<Position>>,
    callback: Option<Arc<dyn Fn(Position) + Send + Sync>>,
    forward_task: Option<JoinHandle<()>>,
    refresh_task: Option<JoinHandle<()>>,
}

impl TradeService<LiveOrderGateway> {
    /// Build the service around an approved delegate signer.
    pub fn new(config: EngineConfig, delegate_signer: PrivateKeySigner) -> EngineResult<Self> {
        let network = config.network();
        Self::build(config, network, delegate_signer)
    }

    /// Build the service from a persisted delegate identity.
    ///
    /// Unapproved identities are refused: the exchange would silently reject
    /// every order signed by a key it has not seen an `approveAgent` for.
    pub fn from_identity(config: EngineConfig, identity: &AgentIdentity) -> EngineResult<Self> {
        if !identity.is_approved {
            return Err(EngineError::Config(format!(
                "delegate {} has not been approved on the exchange",
                identity.address
            )));
        }
        Self::new(config, identity.signer()?)
    }

    fn build(
        config: EngineConfig,
        network: Network,
        signer: PrivateKeySigner,
    ) -> EngineResult<Self> {
        let gateway = LiveOrderGateway::new(network, signer.clone())?;
        Self::with_gateway(config, network, signer, gateway)
    }

    /// Rebuild every client against the target network.
    ///
    /// The registry, scheduler and result channel are replaced; positions
    /// still open on the previous network lose their local tracking. A
    /// registered outcome listener is carried over to the new channel.
    pub async fn set_network(&mut self, use_testnet: bool) -> EngineResult<()> {
        let network = Network::from_testnet_flag(use_testnet);
        if network == self.network {
            return Ok(());
        }

        let active = self.scheduler.active_positions().len();
        if active > 0 {
            warn!(active, "Network switch drops tracking of active positions");
        }
        info!(from = %self.network, to = %network, "Switching network");

        let mut config = self.config.clone();
        config.use_testnet = use_testnet;
        let callback = self.callback.take();
        *self = Self::build(config, network, self.signer.clone())?;
        if let Some(callback) = callback {
            self.attach(callback);
        }
        Ok(())
    }
}

impl<G: OrderGateway> TradeService<G> {
    /// Build the service with an explicit gateway implementation.
    pub fn with_gateway(
        config: EngineConfig,
        network: Network,
        signer: PrivateKeySigner,
        gateway: G,
    ) -> EngineResult<Self> {
        let executor = Arc::new(LiveCloseExecutor::new(network, signer.clone())?);
        let (scheduler, results_rx) = PositionScheduler::new(executor, config.scheduler_config());
        let registry = Arc::new(AssetRegistry::new(network)?);
        let refresh_task = Self::spawn_refresh(&config, &registry);

        Ok(Self {
            info: InfoClient::new(network)?,
            registry,
            gateway,
            signer,
            scheduler,
            results_rx: Some(results_rx),
            callback: None,
            forward_task: None,
            refresh_task,
            config,
            network,
        })
    }

    /// Periodic metadata refresh; disabled when `meta_refresh_secs` is zero.
    fn spawn_refresh(config: &EngineConfig, registry: &Arc<AssetRegistry>) -> Option<JoinHandle<()>> {
        if config.meta_refresh_secs == 0 {
            return None;
        }

        let registry = Arc::clone(registry);
        let period = Duration::from_secs(config.meta_refresh_secs);
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // First tick fires immediately; the registry lazy-loads on first
            // use, so skip it.
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = registry.refresh().await {
                    warn!(error = %e, "Scheduled asset metadata refresh failed");
                }
            }
        }))
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Delegation manager backed by the configured key store: file-backed
    /// when `key_store_path` is set, in-memory otherwise.
    pub fn delegation_manager(&self) -> EngineResult<DelegationManager<Box<dyn KeyStore>>> {
        let store: Box<dyn KeyStore> = match &self.config.key_store_path {
            Some(path) => Box::new(FileKeyStore::open(path)?),
            None => Box::new(InMemoryKeyStore::new()),
        };
        Ok(DelegationManager::new(store, self.network)?)
    }

    /// Place one leveraged, time-boxed bet.
    ///
    /// Steps: asset lookup, leverage clamp + acknowledged leverage set,
    /// sizing from the margin budget, aggressive IOC submit, position
    /// registration with the scheduler.
    pub async fn place_prediction_order(&self, request: OrderRequest) -> EngineResult<Position> {
        self.registry.ensure_loaded().await?;
        let config = self.registry.get(&request.asset)?;

        let leverage = config.clamp_leverage(request.leverage);
        if leverage != request.leverage {
            info!(
                asset = %request.asset,
                requested = request.leverage,
                clamped = leverage,
                "Leverage clamped to asset maximum"
            );
        }

        let margin = if request.margin > Decimal::ZERO {
            request.margin
        } else {
            debug!(margin = %self.config.default_margin, "No margin given; using configured default");
            self.config.default_margin
        };

        self.gateway.set_leverage(config.asset_index, leverage).await?;

        let size = position_size(&config, margin, leverage, request.reference_price)?;
        let limit_px = aggressive_limit(
            request.reference_price,
            request.direction.is_buy(),
            self.config.price_offset_bps,
        );

        let cloid = ClientOrderId::new();
        info!(
            cloid = %cloid,
            asset = %request.asset,
            direction = %request.direction,
            %size,
            %limit_px,
            leverage,
            "Submitting open order"
        );

        let wire = OrderWire::ioc(&config, request.direction, limit_px, size, false, &cloid);
        let status = self.gateway.submit_order(OrderAction::single(wire)).await?;

        let opened_at_ms = Utc::now().timestamp_millis() as u64;
        let position = match status {
            OrderStatus::Filled {
                avg_px,
                total_sz,
                oid,
            } => {
                info!(cloid = %cloid, %avg_px, %total_sz, oid, "Open order filled");
                build_position(
                    &request,
                    cloid,
                    Some(oid),
                    avg_px,
                    total_sz,
                    margin,
                    leverage,
                    true,
                    opened_at_ms,
                )
            }
            OrderStatus::Resting { oid } => {
                // Exposure is live even though the fill has not been
                // reported, so the position is tracked and scheduled anyway.
                warn!(cloid = %cloid, oid, "IOC open order rested; tracking with requested values");
                build_position(
                    &request,
                    cloid,
                    Some(oid),
                    request.reference_price,
                    size,
                    margin,
                    leverage,
                    false,
                    opened_at_ms,
                )
            }
            OrderStatus::Error(message) => {
                warn!(cloid = %cloid, message = %message, "Open order rejected");
                return Err(EngineError::ExchangeRejection(message));
            }
        };

        self.scheduler.track(position.clone(), config);
        Ok(position)
    }

    /// Register the outcome listener. At most one listener; returns false if
    /// one is already attached.
    pub fn on_position_result<F>(&mut self, callback: F) -> bool
    where
        F: Fn(Position) + Send + Sync + 'static,
    {
        if self.callback.is_some() {
            warn!("Position result listener already registered");
            return false;
        }
        self.attach(Arc::new(callback));
        true
    }

    /// Bridge the results channel to the callback.
    fn attach(&mut self, callback: Arc<dyn Fn(Position) + Send + Sync>) {
        if let Some(mut rx) = self.results_rx.take() {
            let forward = Arc::clone(&callback);
            self.forward_task = Some(tokio::spawn(async move {
                while let Some(position) = rx.recv().await {
                    forward(position);
                }
            }));
        }
        self.callback = Some(callback);
    }

    /// Positions that have not finished closing.
    pub fn get_active_positions(&self) -> Vec<Position> {
        self.scheduler.active_positions()
    }

    /// Close a position at market now instead of waiting for its timer.
    pub async fn cancel_position(&self, cloid: &str) -> bool {
        self.scheduler.cancel(cloid).await
    }

    /// Drop settled positions from the registry.
    pub fn clear_completed_positions(&self) -> usize {
        self.scheduler.clear_completed()
    }

    /// Force an asset metadata refresh.
    pub async fn refresh_assets(&self) -> EngineResult<usize> {
        self.registry.refresh().await
    }

    /// Withdrawable balance for a user address, from clearinghouse state.
    pub async fn withdrawable(&self, user_address: &str) -> EngineResult<Decimal> {
        Ok(self
            .info
            .fetch_account_state(user_address)
            .await?
            .withdrawable)
    }
}

impl<G: OrderGateway> Drop for TradeService<G> {
    fn drop(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
        if let Some(task) = self.forward_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use updown_core::{AssetConfig, Direction};

    struct MockGateway {
        calls: Mutex<Vec<&'static str>>,
        leverage_fails: bool,
        status: OrderStatus,
    }

    impl MockGateway {
        fn filling(avg_px: Price, total_sz: Size) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                leverage_fails: false,
                status: OrderStatus::Filled {
                    avg_px,
                    total_sz,
                    oid: 7,
                },
            })
        }

        fn with_status(status: OrderStatus) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                leverage_fails: false,
                status,
            })
        }

        fn failing_leverage() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                leverage_fails: true,
                status: OrderStatus::Error("unreachable".to_string()),
            })
        }
    }

    impl OrderGateway for Arc<MockGateway> {
        fn set_leverage(
            &self,
            _asset_index: u32,
            _leverage: u32,
        ) -> impl std::future::Future<Output = EngineResult<()>> + Send {
            self.calls.lock().push("leverage");
            let fails = self.leverage_fails;
            async move {
                if fails {
                    Err(EngineError::ExchangeRejection(
                        "leverage update failed".to_string(),
                    ))
                } else {
                    Ok(())
                }
            }
        }

        fn submit_order(
            &self,
            _action: OrderAction,
        ) -> impl std::future::Future<Output = EngineResult<OrderStatus>> + Send {
            self.calls.lock().push("order");
            let status = self.status.clone();
            async move { Ok(status) }
        }
    }

    fn eth() -> AssetConfig {
        AssetConfig {
            name: "ETH".to_string(),
            asset_index: 1,
            sz_decimals: 4,
            max_leverage: 25,
        }
    }

    fn service_with(gateway: Arc<MockGateway>) -> TradeService<Arc<MockGateway>> {
        let config = EngineConfig::default();
        let network = config.network();
        let service =
            TradeService::with_gateway(config, network, PrivateKeySigner::random(), gateway)
                .unwrap();
        service.registry.replace_all(vec![eth()]);
        service
    }

    fn sample_request() -> OrderRequest {
        OrderRequest {
            asset: "ETH".to_string(),
            direction: Direction::Up,
            reference_price: Price::new(dec!(3000)),
            margin: dec!(10),
            leverage: 20,
            duration_ms: 30_000,
        }
    }

    #[test]
    fn test_build_position_from_fill() {
        let request = sample_request();
        let cloid = ClientOrderId::new();
        let position = build_position(
            &request,
            cloid.clone(),
            Some(7),
            Price::new(dec!(3001.5)),
            Size::new(dec!(0.0999)),
            dec!(10),
            25,
            true,
            1_700_000_000_000,
        );

        // Actual fill values win over the requested ones.
        assert_eq!(position.entry_price, Price::new(dec!(3001.5)));
        assert_eq!(position.size, Size::new(dec!(0.0999)));
        assert_eq!(position.leverage, 25);
        assert!(position.filled);
        assert!(!position.closed);
        assert_eq!(position.cloid, cloid);
        assert_eq!(position.duration_ms, 30_000);
    }

    #[test]
    fn test_build_position_resting_uses_requested_values() {
        let request = sample_request();
        let position = build_position(
            &request,
            ClientOrderId::new(),
            Some(8),
            request.reference_price,
            Size::new(dec!(0.1)),
            dec!(10),
            30,
            false,
            1_700_000_000_000,
        );

        assert_eq!(position.entry_price, request.reference_price);
        assert!(!position.filled);
    }

    #[test]
    fn test_from_identity_refuses_unapproved() {
        let identity = AgentIdentity::generate();
        assert!(matches!(
            TradeService::from_identity(EngineConfig::default(), &identity),
            Err(EngineError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_from_identity_builds_when_approved() {
        let mut identity = AgentIdentity::generate();
        identity.is_approved = true;
        let service = TradeService::from_identity(EngineConfig::default(), &identity).unwrap();
        assert_eq!(service.network(), Network::Testnet);
    }

    #[tokio::test]
    async fn test_leverage_acknowledged_before_order_submission() {
        let gateway = MockGateway::filling(Price::new(dec!(3001)), Size::new(dec!(0.0666)));
        let service = service_with(Arc::clone(&gateway));

        let position = service.place_prediction_order(sample_request()).await.unwrap();

        assert_eq!(*gateway.calls.lock(), vec!["leverage", "order"]);
        assert!(position.filled);
        assert_eq!(position.entry_price, Price::new(dec!(3001)));
        assert_eq!(service.get_active_positions().len(), 1);
    }

    #[tokio::test]
    async fn test_leverage_failure_blocks_order_submission() {
        let gateway = MockGateway::failing_leverage();
        let service = service_with(Arc::clone(&gateway));

        let err = service
            .place_prediction_order(sample_request())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::ExchangeRejection(_)));
        // The open order never went out and nothing is tracked.
        assert_eq!(*gateway.calls.lock(), vec!["leverage"]);
        assert!(service.get_active_positions().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_order_is_not_tracked() {
        let gateway =
            MockGateway::with_status(OrderStatus::Error("Insufficient margin".to_string()));
        let service = service_with(Arc::clone(&gateway));

        let err = service
            .place_prediction_order(sample_request())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::ExchangeRejection(_)));
        assert!(service.get_active_positions().is_empty());
    }

    #[tokio::test]
    async fn test_resting_order_is_tracked() {
        let gateway = MockGateway::with_status(OrderStatus::Resting { oid: 9 });
        let service = service_with(gateway);

        let position = service.place_prediction_order(sample_request()).await.unwrap();

        assert!(!position.filled);
        assert_eq!(position.oid, Some(9));
        assert_eq!(service.get_active_positions().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_margin_falls_back_to_configured_default() {
        let gateway = MockGateway::with_status(OrderStatus::Resting { oid: 3 });
        let service = service_with(gateway);

        let mut request = sample_request();
        request.margin = Decimal::ZERO;
        let position = service.place_prediction_order(request).await.unwrap();

        // Sized from the default $10 margin: 10 * 20 / 3000 = 0.0666.
        assert_eq!(position.margin, dec!(10));
        assert_eq!(position.size, Size::new(dec!(0.0666)));
    }

    #[tokio::test]
    async fn test_refresh_task_follows_config() {
        let gateway = MockGateway::with_status(OrderStatus::Resting { oid: 1 });
        let service = service_with(Arc::clone(&gateway));
        assert!(service.refresh_task.is_some());

        let mut config = EngineConfig::default();
        config.meta_refresh_secs = 0;
        let network = config.network();
        let service =
            TradeService::with_gateway(config, network, PrivateKeySigner::random(), gateway)
                .unwrap();
        assert!(service.refresh_task.is_none());
    }

    #[tokio::test]
    async fn test_delegation_manager_persists_to_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.json");

        let mut config = EngineConfig::default();
        config.key_store_path = Some(path.to_string_lossy().into_owned());
        let network = config.network();
        let gateway = MockGateway::with_status(OrderStatus::Resting { oid: 1 });
        let service =
            TradeService::with_gateway(config, network, PrivateKeySigner::random(), gateway)
                .unwrap();

        let user = alloy::primitives::Address::repeat_byte(0x11);
        let first = service
            .delegation_manager()
            .unwrap()
            .get_or_create(user)
            .unwrap();

        // A fresh manager over the same path sees the same delegate.
        let second = service
            .delegation_manager()
            .unwrap()
            .get_or_create(user)
            .unwrap();
        assert_eq!(first.address, second.address);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_result_listener_registers_once() {
        let mut service =
            TradeService::new(EngineConfig::default(), PrivateKeySigner::random()).unwrap();
        assert!(service.on_position_result(|_position| {}));
        assert!(!service.on_position_result(|_position| {}));
    }

    #[tokio::test]
    async fn test_empty_service_surface() {
        let service =
            TradeService::new(EngineConfig::default(), PrivateKeySigner::random()).unwrap();
        assert!(service.get_active_positions().is_empty());
        assert!(!service.cancel_position("0xmissing").await);
        assert_eq!(service.clear_completed_positions(), 0);
    }

    #[tokio::test]
    async fn test_set_network_rebuilds() {
        let mut service =
            TradeService::new(EngineConfig::default(), PrivateKeySigner::random()).unwrap();
        assert_eq!(service.network(), Network::Testnet);

        service.set_network(false).await.unwrap();
        assert_eq!(service.network(), Network::Mainnet);

        // No-op when already on the target network.
        service.set_network(false).await.unwrap();
        assert_eq!(service.network(), Network::Mainnet);
    }

    #[tokio::test]
    async fn test_set_network_rebridges_result_listener() {
        let mut service =
            TradeService::new(EngineConfig::default(), PrivateKeySigner::random()).unwrap();
        assert!(service.on_position_result(|_position| {}));

        service.set_network(false).await.unwrap();

        // The listener survived the rebuild: it is bound to the new results
        // channel and still counts as registered.
        assert!(service.callback.is_some());
        assert!(service.forward_task.is_some());
        assert!(service.results_rx.is_none());
        assert!(!service.on_position_result(|_position| {}));
    }
}
