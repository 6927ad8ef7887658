//! Delegate (agent) key material.
//!
//! Security notes:
//! - Private keys live in `PrivateKeySigner` at signing time; the persisted
//!   hex passes through `Zeroizing` buffers when parsed.
//! - Never log private key material; `Debug` redacts it.

use std::fmt;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{AgentError, AgentResult};

/// A generated delegate keypair plus its approval state.
#[derive(Clone, Serialize, Deserialize)]
pub struct AgentIdentity {
    /// Delegate address derived from the key.
    pub address: Address,
    /// Private key as 0x-prefixed hex.
    private_key: String,
    /// Whether the exchange has acknowledged the approval.
    pub is_approved: bool,
}

impl AgentIdentity {
    /// Generate a fresh random delegate key, initially unapproved.
    pub fn generate() -> Self {
        let signer = PrivateKeySigner::random();
        let private_key = format!("0x{}", hex::encode(signer.to_bytes()));
        Self {
            address: signer.address(),
            private_key,
            is_approved: false,
        }
    }

    /// Rebuild the signer from the stored key.
    pub fn signer(&self) -> AgentResult<PrivateKeySigner> {
        let trimmed = self.private_key.trim().trim_start_matches("0x");
        let secret_bytes: Zeroizing<Vec<u8>> = Zeroizing::new(
            hex::decode(trimmed).map_err(|e| AgentError::InvalidKey(e.to_string()))?,
        );
        let signer = PrivateKeySigner::from_slice(&secret_bytes)
            .map_err(|e| AgentError::InvalidKey(e.to_string()))?;

        if signer.address() != self.address {
            return Err(AgentError::InvalidKey(format!(
                "stored key derives {} but record claims {}",
                signer.address(),
                self.address
            )));
        }
        Ok(signer)
    }

    /// Lowercase 0x-hex form of the delegate address, as wire actions expect.
    pub fn address_hex(&self) -> String {
        format!("0x{}", hex::encode(self.address.as_slice()))
    }
}

impl fmt::Debug for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentIdentity")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .field("is_approved", &self.is_approved)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_rebuild_signer() {
        let identity = AgentIdentity::generate();
        assert!(!identity.is_approved);

        let signer = identity.signer().unwrap();
        assert_eq!(signer.address(), identity.address);
    }

    #[test]
    fn test_address_mismatch_rejected() {
        let mut identity = AgentIdentity::generate();
        identity.address = Address::repeat_byte(0x42);
        assert!(matches!(
            identity.signer(),
            Err(AgentError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let identity = AgentIdentity::generate();
        let debug = format!("{identity:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains(&identity.private_key[2..10]));
    }

    #[test]
    fn test_address_hex_lowercase() {
        let identity = AgentIdentity::generate();
        let hex = identity.address_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 42);
        assert_eq!(hex, hex.to_lowercase());
    }

    #[test]
    fn test_serde_roundtrip_preserves_key() {
        let identity = AgentIdentity::generate();
        let json = serde_json::to_string(&identity).unwrap();
        let restored: AgentIdentity = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.address, identity.address);
        assert_eq!(restored.is_approved, identity.is_approved);
        assert_eq!(
            restored.signer().unwrap().address(),
            identity.signer().unwrap().address()
        );
    }
}
