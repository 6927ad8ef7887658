//! Exchange client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Account does not exist on the exchange; a deposit is required")]
    NeedsDeposit,

    #[error("Exchange rejected the request: {0}")]
    Rejected(String),

    #[error("Unexpected response shape: {0}")]
    UnexpectedResponse(String),
}

impl ExchangeError {
    /// Classify a rejection string from the exchange.
    ///
    /// Replies like "User or API Wallet 0x... does not exist" mean the
    /// account was never funded, which callers surface differently from an
    /// ordinary rejection.
    pub fn from_rejection(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        if lowered.contains("does not exist") || lowered.contains("must deposit") {
            ExchangeError::NeedsDeposit
        } else {
            ExchangeError::Rejected(message)
        }
    }
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_deposit_classification() {
        let err = ExchangeError::from_rejection(
            "User or API Wallet 0x1111111111111111111111111111111111111111 does not exist.",
        );
        assert!(matches!(err, ExchangeError::NeedsDeposit));

        let err = ExchangeError::from_rejection("Order price too far from mark");
        assert!(matches!(err, ExchangeError::Rejected(_)));
    }
}
