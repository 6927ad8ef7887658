//! Core domain types for the updown prediction-trading engine.
//!
//! This crate provides the fundamental types shared across the system:
//! - `Price`, `Size`: precision-safe numeric types
//! - `AssetConfig`: per-asset reference data and wire formatting rules
//! - `Direction`, `ClientOrderId`, `OrderRequest`: order-side types
//! - `Position`, `Pnl`, `TradeResult`: bet lifecycle types
//! - `Network`: exchange deployment selection

pub mod asset;
pub mod decimal;
pub mod error;
pub mod network;
pub mod order;
pub mod position;
pub mod pricing;

pub use asset::{AssetConfig, MAX_PRICE_DECIMALS, MAX_SIG_FIGS};
pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use network::Network;
pub use order::{ClientOrderId, Direction, OrderRequest};
pub use position::{Pnl, Position, TradeResult};
pub use pricing::{aggressive_limit, position_size};
