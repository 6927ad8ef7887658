//! User-domain signing for the delegation approval.
//!
//! The approval is ordinary EIP-712 typed data signed by the user's primary
//! key. Unlike the agent domain, the domain chain id here is the real network
//! id, so wallets display and verify it as a normal transaction-style
//! signature. The wire action also carries a `signatureChainId` field; that
//! field is NOT part of the signed payload and is appended to the request
//! only.
//!
//! The primary type name contains a colon ("HyperliquidTransaction:
//! ApproveAgent"), which the `sol!` macro cannot express, so the struct hash
//! is computed manually from the raw type string.

use alloy::primitives::{keccak256, Address, PrimitiveSignature, B256, U256};
use alloy::signers::Signer as AlloySigner;
use alloy::sol_types::{eip712_domain, Eip712Domain};
use updown_core::Network;

use crate::error::SignResult;

/// EIP-712 domain constants for user-signed actions.
pub const USER_DOMAIN_NAME: &str = "HyperliquidSignTransaction";
pub const USER_DOMAIN_VERSION: &str = "1";
pub const USER_VERIFYING_CONTRACT: Address = Address::ZERO;

/// Raw EIP-712 type string for the approval payload.
const APPROVE_AGENT_TYPE: &str = "HyperliquidTransaction:ApproveAgent(string hyperliquidChain,address agentAddress,string agentName,uint64 nonce)";

/// Typed data the user's primary key signs to approve an agent.
#[derive(Debug, Clone)]
pub struct ApproveAgentPayload {
    /// "Mainnet" or "Testnet".
    pub hyperliquid_chain: String,
    /// Delegate (agent) address being approved.
    pub agent_address: Address,
    /// Human-readable label for the agent.
    pub agent_name: String,
    /// Approval nonce, conventionally the current Unix ms.
    pub nonce: u64,
}

impl ApproveAgentPayload {
    pub fn new(network: Network, agent_address: Address, agent_name: &str, nonce: u64) -> Self {
        Self {
            hyperliquid_chain: network.chain_label().to_string(),
            agent_address,
            agent_name: agent_name.to_string(),
            nonce,
        }
    }

    /// Domain separator over the real network chain id.
    pub fn domain(network: Network) -> Eip712Domain {
        eip712_domain! {
            name: USER_DOMAIN_NAME,
            version: USER_DOMAIN_VERSION,
            chain_id: network.chain_id(),
            verifying_contract: USER_VERIFYING_CONTRACT,
        }
    }

    /// Struct hash: `keccak256(typeHash || encoded fields)`.
    pub fn struct_hash(&self) -> B256 {
        let type_hash = keccak256(APPROVE_AGENT_TYPE.as_bytes());

        let mut data = Vec::with_capacity(32 * 5);
        data.extend_from_slice(type_hash.as_slice());
        data.extend_from_slice(keccak256(self.hyperliquid_chain.as_bytes()).as_slice());
        data.extend_from_slice(&left_pad_address(self.agent_address));
        data.extend_from_slice(keccak256(self.agent_name.as_bytes()).as_slice());
        data.extend_from_slice(&U256::from(self.nonce).to_be_bytes::<32>());

        keccak256(&data)
    }

    /// Signing hash: `keccak256(0x1901 || domain_separator || struct_hash)`.
    pub fn signing_hash(&self, network: Network) -> B256 {
        let domain_separator = Self::domain(network).hash_struct();
        let struct_hash = self.struct_hash();

        let mut data = Vec::with_capacity(2 + 32 + 32);
        data.extend_from_slice(&[0x19, 0x01]);
        data.extend_from_slice(domain_separator.as_slice());
        data.extend_from_slice(struct_hash.as_slice());

        keccak256(&data)
    }

    /// Sign the approval with the user's primary key.
    pub async fn sign<S: AlloySigner + Send + Sync>(
        &self,
        network: Network,
        signer: &S,
    ) -> SignResult<PrimitiveSignature> {
        Ok(signer.sign_hash(&self.signing_hash(network)).await?)
    }
}

/// ABI-encode an address as a left-padded 32-byte word.
fn left_pad_address(addr: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(addr.as_slice());
    word
}
