//! Order-side types: bet direction, client order ids, and order requests.

use crate::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Bet direction: price goes up (long) or down (short).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Whether opening this bet is a buy on the exchange.
    pub fn is_buy(&self) -> bool {
        matches!(self, Self::Up)
    }

    /// Returns the opposite direction.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// Returns 1 for up, -1 for down (for PnL sign calculations).
    pub fn sign(&self) -> i8 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Client order ID correlating a submission with its fill and close.
///
/// The exchange requires a 128-bit hex cloid ("0x" + 32 hex chars).
/// CRITICAL: every order must carry a unique cloid so retries can never
/// produce duplicate submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create a new unique client order ID.
    pub fn new() -> Self {
        Self(format!("0x{}", Uuid::new_v4().simple()))
    }

    /// Create from an existing string (for parsing responses).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClientOrderId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl AsRef<str> for ClientOrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A single bet attempt: everything needed to size and submit the open order.
///
/// Ephemeral, one per attempt. Leverage is clamped to the asset maximum
/// during sizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    /// Coin symbol (e.g., "BTC").
    pub asset: String,
    /// Bet direction.
    pub direction: Direction,
    /// Reference price the size and aggressive limit are derived from.
    pub reference_price: Price,
    /// Margin budget in USD.
    pub margin: Decimal,
    /// Requested leverage multiplier.
    pub leverage: u32,
    /// Game duration in milliseconds; zero means no automatic close.
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_is_buy() {
        assert!(Direction::Up.is_buy());
        assert!(!Direction::Down.is_buy());
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Up.opposite(), Direction::Down);
        assert_eq!(Direction::Down.opposite(), Direction::Up);
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Up.sign(), 1);
        assert_eq!(Direction::Down.sign(), -1);
    }

    #[test]
    fn test_client_order_id_unique() {
        let id1 = ClientOrderId::new();
        let id2 = ClientOrderId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_client_order_id_wire_format() {
        let id = ClientOrderId::new();
        assert!(id.as_str().starts_with("0x"));
        assert_eq!(id.as_str().len(), 34);
        assert!(id.as_str()[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
