//! Agent and delegation error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Account does not exist on the exchange; a deposit is required before approval")]
    NeedsDeposit,

    #[error("Key store error: {0}")]
    Store(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Signing error: {0}")]
    Signing(#[from] updown_signing::SignError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] updown_exchange::ExchangeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AgentResult<T> = Result<T, AgentError>;
