//! Lifecycle error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Exchange error: {0}")]
    Exchange(#[from] updown_exchange::ExchangeError),

    #[error("Signing error: {0}")]
    Signing(#[from] updown_signing::SignError),

    #[error("Unknown position: {0}")]
    UnknownPosition(String),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
