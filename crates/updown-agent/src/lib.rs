//! Delegate key management and exchange approval.
//!
//! A delegate ("agent") key is generated per user and network, persisted,
//! and approved on the exchange once via a user-signed action. After
//! approval the delegate signs trades on the user's behalf; it can never
//! withdraw funds.

pub mod delegation;
pub mod error;
pub mod identity;
pub mod store;

pub use delegation::{
    build_approval_action, ApprovalGateway, DelegationManager, LiveApprovalGateway,
};
pub use error::{AgentError, AgentResult};
pub use identity::AgentIdentity;
pub use store::{storage_key, FileKeyStore, InMemoryKeyStore, KeyStore};
