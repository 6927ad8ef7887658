//! Wire action types for the exchange endpoint.
//!
//! IMPORTANT: struct field order is canonical. The action hash serializes
//! these structs with `rmp_serde::to_vec_named`, and the exchange recomputes
//! the same hash from its own canonical ordering; reordering fields (or
//! serializing `None` instead of omitting the key) changes the hash and the
//! exchange silently rejects the signature.

use serde::Serialize;
use updown_core::{AssetConfig, ClientOrderId, Direction, Price, Size};

/// Single order in wire form.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWire {
    /// Asset index.
    #[serde(rename = "a")]
    pub asset: u32,

    /// Buy (true) or sell (false).
    #[serde(rename = "b")]
    pub is_buy: bool,

    /// Limit price as string.
    #[serde(rename = "p")]
    pub limit_px: String,

    /// Size as string.
    #[serde(rename = "s")]
    pub sz: String,

    /// Reduce-only flag.
    #[serde(rename = "r")]
    pub reduce_only: bool,

    /// Order type.
    #[serde(rename = "t")]
    pub order_type: OrderTypeWire,

    /// Client order id (omit key entirely when absent).
    #[serde(rename = "c", skip_serializing_if = "Option::is_none")]
    pub cloid: Option<String>,
}

impl OrderWire {
    /// Build an immediate-or-cancel order wire with exchange-format strings.
    pub fn ioc(
        config: &AssetConfig,
        direction: Direction,
        limit_px: Price,
        sz: Size,
        reduce_only: bool,
        cloid: &ClientOrderId,
    ) -> Self {
        Self {
            asset: config.asset_index,
            is_buy: direction.is_buy(),
            limit_px: config.format_price(limit_px),
            sz: config.format_size(sz),
            reduce_only,
            order_type: OrderTypeWire::ioc(),
            cloid: Some(cloid.to_string()),
        }
    }
}

/// Order type wire format: `{"limit": {"tif": "Ioc"}}`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderTypeWire {
    pub limit: LimitOrderType,
}

impl OrderTypeWire {
    /// Immediate-or-cancel.
    pub fn ioc() -> Self {
        Self {
            limit: LimitOrderType {
                tif: "Ioc".to_string(),
            },
        }
    }
}

/// Limit order time-in-force.
#[derive(Debug, Clone, Serialize)]
pub struct LimitOrderType {
    pub tif: String,
}

/// `order` action. Field order: type, orders, grouping.
#[derive(Debug, Clone, Serialize)]
pub struct OrderAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub orders: Vec<OrderWire>,
    pub grouping: String,
}

impl OrderAction {
    /// Single-order action with the default "na" grouping.
    pub fn single(order: OrderWire) -> Self {
        Self {
            action_type: "order".to_string(),
            orders: vec![order],
            grouping: "na".to_string(),
        }
    }
}

/// `updateLeverage` action. Field order: type, asset, isCross, leverage.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateLeverageAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub asset: u32,
    #[serde(rename = "isCross")]
    pub is_cross: bool,
    pub leverage: u32,
}

impl UpdateLeverageAction {
    pub fn new(asset: u32, leverage: u32, is_cross: bool) -> Self {
        Self {
            action_type: "updateLeverage".to_string(),
            asset,
            is_cross,
            leverage,
        }
    }
}

/// `approveAgent` action (user-signed).
///
/// `signature_chain_id` rides on the wire action only; the signed typed data
/// excludes it.
#[derive(Debug, Clone, Serialize)]
pub struct ApproveAgentAction {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(rename = "hyperliquidChain")]
    pub hyperliquid_chain: String,
    #[serde(rename = "signatureChainId")]
    pub signature_chain_id: String,
    #[serde(rename = "agentAddress")]
    pub agent_address: String,
    #[serde(rename = "agentName")]
    pub agent_name: String,
    pub nonce: u64,
}
