//! Order execution service for the updown prediction game.
//!
//! Wires the other crates together: `TradeService` sizes and submits
//! delegate-signed orders, registers positions with the lifecycle scheduler,
//! and exposes outcomes, cancellation and network switching to the caller.

pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod registry;
pub mod service;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use gateway::{LiveOrderGateway, OrderGateway};
pub use logging::init_logging;
pub use registry::AssetRegistry;
pub use service::TradeService;
