//! Engine error taxonomy.
//!
//! Four failure families reach callers: deposit-needed, signing, exchange
//! rejection, and network. Everything below the engine boundary maps into
//! one of them, plus validation errors for bad requests.

use thiserror::Error;
use updown_core::CoreError;
use updown_exchange::ExchangeError;
use updown_signing::SignError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Account does not exist on the exchange; a deposit is required")]
    NeedsDeposit,

    #[error("Signing failure: {0}")]
    Signing(String),

    #[error("Exchange rejected the request: {0}")]
    ExchangeRejection(String),

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ExchangeError> for EngineError {
    fn from(e: ExchangeError) -> Self {
        match e {
            ExchangeError::NeedsDeposit => EngineError::NeedsDeposit,
            ExchangeError::Rejected(message) => EngineError::ExchangeRejection(message),
            ExchangeError::HttpClient(message) => EngineError::Network(message),
            ExchangeError::Json(e) => EngineError::Network(e.to_string()),
            ExchangeError::UnexpectedResponse(message) => EngineError::Network(message),
        }
    }
}

impl From<SignError> for EngineError {
    fn from(e: SignError) -> Self {
        EngineError::Signing(e.to_string())
    }
}

impl From<updown_agent::AgentError> for EngineError {
    fn from(e: updown_agent::AgentError) -> Self {
        match e {
            updown_agent::AgentError::NeedsDeposit => EngineError::NeedsDeposit,
            updown_agent::AgentError::Signing(e) => e.into(),
            updown_agent::AgentError::Exchange(e) => e.into(),
            other => EngineError::Config(other.to_string()),
        }
    }
}

impl From<updown_lifecycle::LifecycleError> for EngineError {
    fn from(e: updown_lifecycle::LifecycleError) -> Self {
        match e {
            updown_lifecycle::LifecycleError::Exchange(e) => e.into(),
            updown_lifecycle::LifecycleError::Signing(e) => e.into(),
            updown_lifecycle::LifecycleError::UnknownPosition(cloid) => {
                EngineError::InvalidOrder(format!("unknown position {cloid}"))
            }
        }
    }
}

impl From<CoreError> for EngineError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::UnknownAsset(asset) => EngineError::UnknownAsset(asset),
            other => EngineError::InvalidOrder(other.to_string()),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_error_mapping() {
        assert!(matches!(
            EngineError::from(ExchangeError::NeedsDeposit),
            EngineError::NeedsDeposit
        ));
        assert!(matches!(
            EngineError::from(ExchangeError::Rejected("px too far".to_string())),
            EngineError::ExchangeRejection(_)
        ));
        assert!(matches!(
            EngineError::from(ExchangeError::HttpClient("timeout".to_string())),
            EngineError::Network(_)
        ));
    }

    #[test]
    fn test_core_error_mapping() {
        assert!(matches!(
            EngineError::from(CoreError::UnknownAsset("WAT".to_string())),
            EngineError::UnknownAsset(_)
        ));
        assert!(matches!(
            EngineError::from(CoreError::InvalidSize("too small".to_string())),
            EngineError::InvalidOrder(_)
        ));
    }
}
