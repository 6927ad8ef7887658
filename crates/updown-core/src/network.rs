//! Exchange network selection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which exchange deployment to talk to.
///
/// The network decides endpoint URLs and the real chain id used for the
/// user-signed delegation approval. The agent-signing domain is independent
/// of this and always uses its fixed sentinel chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
}

impl Network {
    pub fn from_testnet_flag(use_testnet: bool) -> Self {
        if use_testnet {
            Self::Testnet
        } else {
            Self::Mainnet
        }
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self, Self::Mainnet)
    }

    /// Info endpoint URL.
    pub fn info_url(&self) -> &'static str {
        match self {
            Self::Mainnet => "https://api.hyperliquid.xyz/info",
            Self::Testnet => "https://api.hyperliquid-testnet.xyz/info",
        }
    }

    /// Exchange (signed action) endpoint URL.
    pub fn exchange_url(&self) -> &'static str {
        match self {
            Self::Mainnet => "https://api.hyperliquid.xyz/exchange",
            Self::Testnet => "https://api.hyperliquid-testnet.xyz/exchange",
        }
    }

    /// Real chain id for the user-signed approval domain.
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Mainnet => 42161,
            Self::Testnet => 421614,
        }
    }

    /// Chain label carried inside user-signed wire actions.
    pub fn chain_label(&self) -> &'static str {
        match self {
            Self::Mainnet => "Mainnet",
            Self::Testnet => "Testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_testnet_flag() {
        assert_eq!(Network::from_testnet_flag(true), Network::Testnet);
        assert_eq!(Network::from_testnet_flag(false), Network::Mainnet);
    }

    #[test]
    fn test_chain_ids_differ() {
        assert_ne!(Network::Mainnet.chain_id(), Network::Testnet.chain_id());
    }

    #[test]
    fn test_display_used_in_storage_keys() {
        assert_eq!(Network::Mainnet.to_string(), "mainnet");
        assert_eq!(Network::Testnet.to_string(), "testnet");
    }
}
