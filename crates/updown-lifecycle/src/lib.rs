//! Position lifecycle: registry, expiry timers and market close.

pub mod close;
pub mod error;
pub mod price_source;
pub mod scheduler;

pub use close::{build_close_order, CloseExecutor, CloseOrder, LiveCloseExecutor};
pub use error::{LifecycleError, LifecycleResult};
pub use price_source::{HttpPriceSource, PriceSource};
pub use scheduler::{CloseReason, PositionScheduler, SchedulerConfig};
