//! Position registry and scheduled auto-close.
//!
//! Each tracked position carries a timer that fires after the game duration
//! and triggers the close path. Manual cancellation goes through the same
//! path, and a state machine guards the transition so the two can race
//! without double-closing: exactly one caller moves a position from Open to
//! Closing, and only that caller settles it and emits the result.
//!
//! The close path never propagates errors outward. When the market price or
//! the close fill are unavailable, settlement falls back along
//! close fill -> fetched market price -> entry price, and the position is
//! settled regardless.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use updown_core::{AssetConfig, Position, Price, TradeResult};
use updown_exchange::OrderStatus;

use crate::close::{build_close_order, CloseExecutor};

/// Scheduler tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Offset applied to the close limit price, in basis points.
    pub price_offset_bps: u32,
    /// Budget for each network step of the close path (price fetch, submit).
    pub close_timeout_ms: u64,
    /// Capacity of the settled-position channel.
    pub results_buffer: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            price_offset_bps: 200,
            close_timeout_ms: 10_000,
            results_buffer: 64,
        }
    }
}

/// Why a close was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The game duration elapsed.
    Expired,
    /// The player cancelled early.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleState {
    Open,
    Closing,
    Closed,
}

struct TrackedPosition {
    position: Position,
    config: AssetConfig,
    state: LifecycleState,
    timer: Option<JoinHandle<()>>,
}

/// Registry of live positions keyed by opening cloid.
pub struct PositionScheduler<E: CloseExecutor> {
    executor: Arc<E>,
    config: SchedulerConfig,
    positions: DashMap<String, TrackedPosition>,
    results_tx: mpsc::Sender<Position>,
}

impl<E: CloseExecutor> PositionScheduler<E> {
    /// Create a scheduler and the channel settled positions arrive on.
    pub fn new(executor: Arc<E>, config: SchedulerConfig) -> (Arc<Self>, mpsc::Receiver<Position>) {
        let (results_tx, results_rx) = mpsc::channel(config.results_buffer);
        let scheduler = Arc::new(Self {
            executor,
            config,
            positions: DashMap::new(),
            results_tx,
        });
        (scheduler, results_rx)
    }

    /// Register a position and arm its expiry timer.
    ///
    /// Re-tracking an existing cloid replaces the entry and disarms the old
    /// timer. A zero duration means no automatic close; the position stays
    /// open until cancelled.
    pub fn track(self: &Arc<Self>, position: Position, config: AssetConfig) {
        let cloid = position.cloid.to_string();
        let duration_ms = position.duration_ms;

        let timer = if duration_ms > 0 {
            let scheduler = Arc::clone(self);
            let timer_cloid = cloid.clone();
            Some(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(duration_ms)).await;
                scheduler.close(&timer_cloid, CloseReason::Expired).await;
            }))
        } else {
            None
        };

        info!(
            cloid = %cloid,
            asset = %position.asset,
            direction = %position.direction,
            duration_ms,
            "Tracking position"
        );

        let previous = self.positions.insert(
            cloid,
            TrackedPosition {
                position,
                config,
                state: LifecycleState::Open,
                timer,
            },
        );
        if let Some(previous) = previous {
            if let Some(old_timer) = previous.timer {
                old_timer.abort();
            }
        }
    }

    /// Cancel a position early by closing it at market now.
    ///
    /// Returns false when the cloid is unknown or the position is already
    /// closing or closed.
    pub async fn cancel(&self, cloid: &str) -> bool {
        self.close(cloid, CloseReason::Cancelled).await
    }

    /// Run the close path for a position.
    ///
    /// At most one invocation per cloid gets past the Open check; later ones
    /// (the losing side of a timer/cancel race, or repeat cancels) return
    /// false without side effects.
    async fn close(&self, cloid: &str, reason: CloseReason) -> bool {
        let (position, config) = {
            let Some(mut entry) = self.positions.get_mut(cloid) else {
                debug!(cloid = %cloid, ?reason, "Close requested for unknown position");
                return false;
            };
            if entry.state != LifecycleState::Open {
                debug!(cloid = %cloid, ?reason, state = ?entry.state, "Close already handled");
                return false;
            }
            entry.state = LifecycleState::Closing;
            // The timer task runs this same path for Expired; it must not
            // abort itself mid-close.
            if reason != CloseReason::Expired {
                if let Some(timer) = entry.timer.take() {
                    timer.abort();
                }
            }
            (entry.position.clone(), entry.config.clone())
        };

        let step_budget = Duration::from_millis(self.config.close_timeout_ms);

        let market_price = match timeout(step_budget, self.executor.market_price(&position.asset))
            .await
        {
            Ok(price) => price,
            Err(_) => {
                warn!(cloid = %cloid, asset = %position.asset, "Market price fetch timed out");
                None
            }
        };

        let reference = market_price.unwrap_or(position.entry_price);
        let order = build_close_order(&position, &config, reference, self.config.price_offset_bps);

        let mut fill_price: Option<Price> = None;
        match timeout(step_budget, self.executor.submit_close(order)).await {
            Ok(Ok(OrderStatus::Filled { avg_px, total_sz, oid })) => {
                info!(cloid = %cloid, %avg_px, %total_sz, oid, ?reason, "Close order filled");
                fill_price = Some(avg_px);
            }
            Ok(Ok(OrderStatus::Resting { oid })) => {
                warn!(cloid = %cloid, oid, "Close order rested instead of filling");
            }
            Ok(Ok(OrderStatus::Error(message))) => {
                warn!(cloid = %cloid, message = %message, "Close order rejected");
            }
            Ok(Err(e)) => {
                warn!(cloid = %cloid, error = %e, "Close submission failed");
            }
            Err(_) => {
                warn!(cloid = %cloid, "Close submission timed out");
            }
        }

        // Exit price priority: close fill, then fetched market, then entry.
        let exit_price = fill_price
            .or(market_price)
            .unwrap_or(position.entry_price);
        let result = TradeResult::from_prices(position.direction, position.entry_price, exit_price);

        let settled = {
            let Some(mut entry) = self.positions.get_mut(cloid) else {
                warn!(cloid = %cloid, "Position vanished during close");
                return false;
            };
            entry.position.settle(exit_price, result);
            entry.state = LifecycleState::Closed;
            entry.position.clone()
        };

        info!(
            cloid = %cloid,
            ?reason,
            entry = %position.entry_price,
            exit = %exit_price,
            result = %result,
            "Position settled"
        );

        // The position is already settled; never block the close path on a
        // full or abandoned results channel.
        if let Err(e) = self.results_tx.try_send(settled) {
            warn!(cloid = %cloid, error = %e, "Dropping settled position result");
        }
        true
    }

    /// Look up a tracked position by cloid.
    pub fn position(&self, cloid: &str) -> Option<Position> {
        self.positions.get(cloid).map(|entry| entry.position.clone())
    }

    /// Positions that have not finished closing.
    pub fn active_positions(&self) -> Vec<Position> {
        self.positions
            .iter()
            .filter(|entry| entry.state != LifecycleState::Closed)
            .map(|entry| entry.position.clone())
            .collect()
    }

    /// Drop settled positions from the registry. Returns how many were removed.
    pub fn clear_completed(&self) -> usize {
        let before = self.positions.len();
        self.positions
            .retain(|_, entry| entry.state != LifecycleState::Closed);
        before - self.positions.len()
    }
}
