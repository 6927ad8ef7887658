//! Agent-domain signing for trade actions.
//!
//! Two-stage process:
//! 1. Canonically hash the action: msgpack bytes + 8-byte big-endian nonce +
//!    vault flag byte (`0x00`, or `0x01` + vault address).
//! 2. Wrap the hash in an `Agent { source, connectionId }` struct and sign it
//!    with EIP-712 under a domain whose chain id is a fixed sentinel.
//!
//! The sentinel chain id is reserved for agent signing and never matches a
//! real network id; it is identical on testnet and mainnet. Signing a trade
//! action under the user-approval domain (or vice versa) produces a signature
//! the exchange silently rejects.

use alloy::primitives::{keccak256, Address, PrimitiveSignature, B256};
use alloy::signers::Signer as AlloySigner;
use alloy::sol;
use alloy::sol_types::{eip712_domain, SolStruct};
use serde::Serialize;

use crate::error::{SignError, SignResult};

/// EIP-712 domain constants for agent-signed actions.
pub const AGENT_DOMAIN_NAME: &str = "Exchange";
pub const AGENT_DOMAIN_VERSION: &str = "1";
/// Sentinel chain id reserved for agent signing; not a real network id.
pub const AGENT_CHAIN_ID: u64 = 1337;
pub const AGENT_VERIFYING_CONTRACT: Address = Address::ZERO;

sol! {
    #[derive(Debug)]
    struct Agent {
        string source;
        bytes32 connectionId;
    }
}

/// Compute the canonical action hash.
///
/// `msgpack(action) || nonce_be8 || (0x00 | 0x01 + vault)` hashed with
/// keccak256. The flag byte is present even without a vault.
pub fn action_hash<A: Serialize>(
    action: &A,
    nonce: u64,
    vault_address: Option<Address>,
) -> SignResult<B256> {
    let mut data = rmp_serde::to_vec_named(action)
        .map_err(|e| SignError::Serialization(e.to_string()))?;

    data.extend_from_slice(&nonce.to_be_bytes());

    match vault_address {
        None => data.push(0x00),
        Some(addr) => {
            data.push(0x01);
            data.extend_from_slice(addr.as_slice());
        }
    }

    Ok(keccak256(&data))
}

/// The EIP-712 struct the agent key actually signs.
#[derive(Debug, Clone)]
pub struct PhantomAgent {
    /// "a" on mainnet, "b" on testnet.
    pub source: String,
    /// Action hash.
    pub connection_id: B256,
}

impl PhantomAgent {
    pub fn new(action_hash: B256, is_mainnet: bool) -> Self {
        Self {
            source: if is_mainnet { "a" } else { "b" }.to_string(),
            connection_id: action_hash,
        }
    }

    /// EIP-712 signing hash: `keccak256(0x1901 || domain_separator || struct_hash)`.
    pub fn signing_hash(&self) -> B256 {
        let domain = eip712_domain! {
            name: AGENT_DOMAIN_NAME,
            version: AGENT_DOMAIN_VERSION,
            chain_id: AGENT_CHAIN_ID,
            verifying_contract: AGENT_VERIFYING_CONTRACT,
        };

        let agent = Agent {
            source: self.source.clone(),
            connectionId: self.connection_id,
        };

        agent.eip712_signing_hash(&domain)
    }

    /// Sign the phantom agent hash with the delegated agent key.
    pub async fn sign<S: AlloySigner + Send + Sync>(
        &self,
        signer: &S,
    ) -> SignResult<PrimitiveSignature> {
        // Do not log the signature; it is authentication material.
        Ok(signer.sign_hash(&self.signing_hash()).await?)
    }
}

/// Hash and sign a trade action with the agent key in one step.
pub async fn sign_action<A: Serialize, S: AlloySigner + Send + Sync>(
    action: &A,
    nonce: u64,
    vault_address: Option<Address>,
    is_mainnet: bool,
    signer: &S,
) -> SignResult<PrimitiveSignature> {
    let hash = action_hash(action, nonce, vault_address)?;
    PhantomAgent::new(hash, is_mainnet).sign(signer).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{OrderAction, OrderWire};
    use alloy::signers::local::PrivateKeySigner;
    use updown_core::{AssetConfig, ClientOrderId, Direction, Price, Size};

    // Well-known test private key (DO NOT use in production).
    const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn test_signer() -> PrivateKeySigner {
        let bytes = hex::decode(TEST_PRIVATE_KEY.trim_start_matches("0x")).unwrap();
        PrivateKeySigner::from_slice(&bytes).unwrap()
    }

    fn vector_action() -> OrderAction {
        let config = AssetConfig {
            name: "xyz:SOL".to_string(),
            asset_index: 110027,
            sz_decimals: 1,
            max_leverage: 20,
        };
        let cloid = ClientOrderId::from_string("0x0de3e244a8f44fc28a6b7bc852d66d19".to_string());
        OrderAction::single(OrderWire::ioc(
            &config,
            Direction::Up,
            Price::new("105.00".parse().unwrap()),
            Size::new("0.2".parse().unwrap()),
            false,
            &cloid,
        ))
    }

    /// Msgpack bytes must match the exchange's canonical serialization
    /// byte-for-byte; a single reordered field breaks every signature.
    #[test]
    fn test_msgpack_canonical_vector() {
        let action = vector_action();
        let bytes = rmp_serde::to_vec_named(&action).unwrap();

        let expected = "83a474797065a56f72646572a66f72646572739187a161ce0001adcba162c3a170a63130352e3030a173a3302e32a172c2a17481a56c696d697481a3746966a3496f63a163d92230783064653365323434613866343466633238613662376263383532643636643139a867726f7570696e67a26e61";
        // The vector was produced with the raw strings "105.00"/"0.2"; our
        // wire builder collapses "105.00" to "105", so compare against the
        // same raw wire shape.
        let raw = OrderAction {
            action_type: "order".to_string(),
            orders: vec![OrderWire {
                asset: 110027,
                is_buy: true,
                limit_px: "105.00".to_string(),
                sz: "0.2".to_string(),
                reduce_only: false,
                order_type: crate::action::OrderTypeWire::ioc(),
                cloid: Some("0x0de3e244a8f44fc28a6b7bc852d66d19".to_string()),
            }],
            grouping: "na".to_string(),
        };
        let raw_bytes = rmp_serde::to_vec_named(&raw).unwrap();
        assert_eq!(hex::encode(&raw_bytes), expected);

        // And the builder-produced action differs only in the price string.
        assert_eq!(bytes.len() + "105.00".len() - "105".len(), raw_bytes.len());
    }

    /// Known action-hash vector for the raw wire action above.
    #[test]
    fn test_action_hash_vector() {
        let raw = OrderAction {
            action_type: "order".to_string(),
            orders: vec![OrderWire {
                asset: 110027,
                is_buy: true,
                limit_px: "105.00".to_string(),
                sz: "0.2".to_string(),
                reduce_only: false,
                order_type: crate::action::OrderTypeWire::ioc(),
                cloid: Some("0x0de3e244a8f44fc28a6b7bc852d66d19".to_string()),
            }],
            grouping: "na".to_string(),
        };

        let hash = action_hash(&raw, 1_769_339_470_576, None).unwrap();
        assert_eq!(
            hex::encode(hash.as_slice()),
            "904c57b8f4b75ac9da005b49298dc39af735ed8c3a89b241f5f1e061e0207868"
        );
    }

    #[test]
    fn test_action_hash_vault_changes_hash() {
        let action = vector_action();
        let vault = Address::repeat_byte(0x42);

        let with_vault = action_hash(&action, 1000, Some(vault)).unwrap();
        let without = action_hash(&action, 1000, None).unwrap();
        assert_ne!(with_vault, without);
    }

    #[test]
    fn test_action_hash_nonce_changes_hash() {
        let action = vector_action();
        assert_ne!(
            action_hash(&action, 1, None).unwrap(),
            action_hash(&action, 2, None).unwrap()
        );
    }

    #[test]
    fn test_phantom_agent_source() {
        let hash = B256::repeat_byte(0xab);
        assert_eq!(PhantomAgent::new(hash, true).source, "a");
        assert_eq!(PhantomAgent::new(hash, false).source, "b");
    }

    /// Fixed signature vector: signing a known hash with a known key must
    /// reproduce the exact r/s/v (RFC 6979 deterministic ECDSA).
    #[tokio::test]
    async fn test_signature_regression_vector() {
        let signer = test_signer();
        let action_hash = B256::from_slice(
            &hex::decode("f01fa6eaca0b8cbd2afe65f8852a2e00d35eae3d19560ece9b8a28614646e849")
                .unwrap(),
        );

        let agent = PhantomAgent::new(action_hash, false);
        let signature = agent.sign(&signer).await.unwrap();

        assert_eq!(
            hex::encode(agent.signing_hash().as_slice()),
            "83591e5c212c7267a0c391ad551ef79625314f78431f5c048eeb67ae416e87a3"
        );
        assert_eq!(
            hex::encode(signature.r().to_be_bytes::<32>()),
            "c73c9797babad24ddd0c7f58d8ce05a659827982085c992df7405a31c446c5d2"
        );
        assert_eq!(
            hex::encode(signature.s().to_be_bytes::<32>()),
            "73aa7587068c020c7b990286cec61ef1d6831a07d16bcb113e0ff912a8194cd9"
        );
        assert!(signature.v());
    }

    /// Recovering the signer address from the signing hash must yield the
    /// agent address; this is what the exchange checks.
    #[tokio::test]
    async fn test_recoverable_address_equivalence() {
        let signer = test_signer();
        let action = vector_action();

        let hash = action_hash(&action, 1_700_000_000_000, None).unwrap();
        let agent = PhantomAgent::new(hash, true);
        let signature = agent.sign(&signer).await.unwrap();

        let recovered = signature
            .recover_address_from_prehash(&agent.signing_hash())
            .unwrap();
        assert_eq!(recovered, signer.address());
    }

    /// Mixing domains: a mainnet-source signature does not recover against
    /// the testnet-source hash.
    #[tokio::test]
    async fn test_source_mismatch_breaks_recovery() {
        let signer = test_signer();
        let hash = B256::repeat_byte(0x11);

        let mainnet = PhantomAgent::new(hash, true);
        let testnet = PhantomAgent::new(hash, false);
        let signature = mainnet.sign(&signer).await.unwrap();

        let recovered = signature.recover_address_from_prehash(&testnet.signing_hash());
        assert!(recovered.map(|a| a != signer.address()).unwrap_or(true));
    }
}
