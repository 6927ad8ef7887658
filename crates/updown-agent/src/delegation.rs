//! Delegation lifecycle: generate, persist and approve delegate keys.
//!
//! Approval is a user-signed action, the only point where the user's primary
//! key touches this system. Everything after it is signed by the delegate.

use std::future::Future;

use alloy::primitives::Address;
use alloy::signers::Signer as AlloySigner;
use tracing::{debug, info};
use updown_core::Network;
use updown_exchange::{
    AccountState, ActionEnvelope, ExchangeClient, ExchangeError, ExchangeResult, InfoClient,
};
use updown_signing::{
    ApproveAgentAction, ApproveAgentPayload, Clock, SignatureWire, SystemClock,
};

use crate::error::{AgentError, AgentResult};
use crate::identity::AgentIdentity;
use crate::store::{storage_key, KeyStore};

/// Build the wire action for an approval.
///
/// `signatureChainId` is the real network chain id in hex; it travels on the
/// wire but is not part of the signed typed data.
pub fn build_approval_action(
    identity: &AgentIdentity,
    network: Network,
    agent_name: &str,
    nonce: u64,
) -> ApproveAgentAction {
    ApproveAgentAction {
        action_type: "approveAgent".to_string(),
        hyperliquid_chain: network.chain_label().to_string(),
        signature_chain_id: format!("{:#x}", network.chain_id()),
        agent_address: identity.address_hex(),
        agent_name: agent_name.to_string(),
        nonce,
    }
}

/// Exchange operations the approval flow needs. Abstracted so the flow can
/// be driven in tests without a network.
pub trait ApprovalGateway: Send + Sync {
    /// Clearinghouse snapshot for a user address.
    fn account_state(&self, user: &str) -> impl Future<Output = ExchangeResult<AccountState>> + Send;

    /// Submit a signed approval envelope and require an ok acknowledgement.
    fn submit_approval(
        &self,
        envelope: &ActionEnvelope,
    ) -> impl Future<Output = ExchangeResult<()>> + Send;
}

/// Production gateway over the real info and trade endpoints.
pub struct LiveApprovalGateway {
    info: InfoClient,
    exchange: ExchangeClient,
}

impl LiveApprovalGateway {
    pub fn new(network: Network) -> ExchangeResult<Self> {
        Ok(Self {
            info: InfoClient::new(network)?,
            exchange: ExchangeClient::new(network)?,
        })
    }
}

impl ApprovalGateway for LiveApprovalGateway {
    fn account_state(&self, user: &str) -> impl Future<Output = ExchangeResult<AccountState>> + Send {
        self.info.fetch_account_state(user)
    }

    fn submit_approval(
        &self,
        envelope: &ActionEnvelope,
    ) -> impl Future<Output = ExchangeResult<()>> + Send {
        self.exchange.submit_action(envelope)
    }
}

/// Manages one delegate identity per (user, network) pair.
pub struct DelegationManager<S: KeyStore, G: ApprovalGateway = LiveApprovalGateway> {
    store: S,
    network: Network,
    gateway: G,
}

impl<S: KeyStore> DelegationManager<S> {
    pub fn new(store: S, network: Network) -> AgentResult<Self> {
        Ok(Self::with_gateway(
            store,
            network,
            LiveApprovalGateway::new(network)?,
        ))
    }
}

impl<S: KeyStore, G: ApprovalGateway> DelegationManager<S, G> {
    pub fn with_gateway(store: S, network: Network, gateway: G) -> Self {
        Self {
            store,
            network,
            gateway,
        }
    }

    /// Look up the user's delegate, generating and persisting one if absent.
    ///
    /// A freshly generated identity is unapproved; it cannot sign accepted
    /// trades until `approve` succeeds.
    pub fn get_or_create(&self, user: Address) -> AgentResult<AgentIdentity> {
        let key = storage_key(user, self.network);
        if let Some(identity) = self.store.get(&key)? {
            debug!(user = %user, agent = %identity.address, "Reusing stored delegate");
            return Ok(identity);
        }

        let identity = AgentIdentity::generate();
        self.store.put(&key, &identity)?;
        info!(user = %user, agent = %identity.address, "Generated new delegate key");
        Ok(identity)
    }

    /// Approve the user's delegate on the exchange.
    ///
    /// Idempotent: an already-approved identity is returned as-is without
    /// touching the network. The account is checked first so an unfunded user
    /// gets a deposit prompt instead of an opaque rejection; the identity
    /// stays unapproved and nothing is submitted in that case.
    pub async fn approve<Sg: AlloySigner + Send + Sync>(
        &self,
        user_signer: &Sg,
        agent_name: &str,
    ) -> AgentResult<AgentIdentity> {
        let user = user_signer.address();
        let key = storage_key(user, self.network);

        let mut identity = self.get_or_create(user)?;
        if identity.is_approved {
            debug!(user = %user, agent = %identity.address, "Delegate already approved");
            return Ok(identity);
        }

        let user_hex = format!("0x{}", hex::encode(user.as_slice()));
        let account = self.gateway.account_state(&user_hex).await?;
        if !account.is_funded() {
            info!(user = %user, "Account not funded; approval needs a deposit");
            return Err(AgentError::NeedsDeposit);
        }

        let nonce = SystemClock.now_ms();
        let payload = ApproveAgentPayload::new(self.network, identity.address, agent_name, nonce);
        let signature = payload.sign(self.network, user_signer).await?;

        let action = build_approval_action(&identity, self.network, agent_name, nonce);
        let envelope = ActionEnvelope::new(&action, nonce, SignatureWire::from(&signature))
            .map_err(AgentError::Exchange)?;
        match self.gateway.submit_approval(&envelope).await {
            Ok(()) => {}
            Err(ExchangeError::NeedsDeposit) => return Err(AgentError::NeedsDeposit),
            Err(e) => return Err(e.into()),
        }

        // Flip the flag only after the exchange acknowledged the approval.
        identity.is_approved = true;
        self.store.put(&key, &identity)?;
        info!(user = %user, agent = %identity.address, "Delegate approved");
        Ok(identity)
    }

    /// Drop the stored delegate for a user, forcing regeneration next time.
    pub fn forget(&self, user: Address) -> AgentResult<()> {
        self.store.delete(&storage_key(user, self.network))
    }
}
