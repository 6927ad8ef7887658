//! Signing error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignError {
    #[error("Signing failed: {0}")]
    SigningFailed(#[from] alloy::signers::Error),

    #[error("Action serialization failed: {0}")]
    Serialization(String),
}

pub type SignResult<T> = Result<T, SignError>;
