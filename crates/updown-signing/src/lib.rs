//! Two-tier signing protocol for the updown engine.
//!
//! Implements both signature domains the exchange distinguishes:
//! - Agent domain: trade actions hashed canonically (msgpack + nonce + vault
//!   flag) and signed under the fixed sentinel chain id.
//! - User domain: the one-time delegation approval signed by the primary
//!   wallet under the real network chain id.
//!
//! Mixing the two domains produces signatures the exchange silently rejects,
//! so each path carries known-vector regression tests.

pub mod action;
pub mod approval;
pub mod error;
pub mod nonce;
pub mod sign;
pub mod wire;

pub use action::{
    ApproveAgentAction, LimitOrderType, OrderAction, OrderTypeWire, OrderWire,
    UpdateLeverageAction,
};
pub use approval::{ApproveAgentPayload, USER_DOMAIN_NAME, USER_DOMAIN_VERSION};
pub use error::{SignError, SignResult};
pub use nonce::{Clock, NonceSource, SystemClock};
pub use sign::{action_hash, sign_action, PhantomAgent, AGENT_CHAIN_ID, AGENT_DOMAIN_NAME};
pub use wire::SignatureWire;
