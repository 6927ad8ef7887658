//! Response types for the trade endpoint.

use rust_decimal::Decimal;
use serde::Deserialize;
use updown_core::{Price, Size};

use crate::error::{ExchangeError, ExchangeResult};

/// Top-level reply envelope: `{"status": "ok"|"err", "response": ...}`.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", content = "response", rename_all = "lowercase")]
pub enum RawExchangeResponse {
    Ok(OkResponse),
    Err(String),
}

#[derive(Debug, Deserialize)]
pub struct OkResponse {
    #[serde(rename = "type")]
    pub response_type: String,
    #[serde(default)]
    pub data: Option<ResponseData>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseData {
    #[serde(default)]
    pub statuses: Vec<RawOrderStatus>,
}

/// Per-order status inside an order reply. Externally tagged:
/// `{"filled": {...}}`, `{"resting": {...}}` or `{"error": "..."}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawOrderStatus {
    Filled(RawFill),
    Resting(RawResting),
    Error(String),
}

#[derive(Debug, Deserialize)]
pub struct RawFill {
    #[serde(rename = "totalSz")]
    pub total_sz: String,
    #[serde(rename = "avgPx")]
    pub avg_px: String,
    pub oid: u64,
}

#[derive(Debug, Deserialize)]
pub struct RawResting {
    pub oid: u64,
}

/// Parsed outcome of a single submitted order.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderStatus {
    /// Order executed; carries the actual fill values.
    Filled {
        avg_px: Price,
        total_sz: Size,
        oid: u64,
    },
    /// Order is resting on the book (should not happen for IOC).
    Resting { oid: u64 },
    /// Exchange accepted the batch but rejected this order.
    Error(String),
}

impl OrderStatus {
    fn parse(raw: RawOrderStatus) -> ExchangeResult<Self> {
        match raw {
            RawOrderStatus::Filled(fill) => {
                let avg_px: Decimal = fill.avg_px.parse().map_err(|_| {
                    ExchangeError::UnexpectedResponse(format!("bad avgPx: {}", fill.avg_px))
                })?;
                let total_sz: Decimal = fill.total_sz.parse().map_err(|_| {
                    ExchangeError::UnexpectedResponse(format!("bad totalSz: {}", fill.total_sz))
                })?;
                Ok(OrderStatus::Filled {
                    avg_px: Price::new(avg_px),
                    total_sz: Size::new(total_sz),
                    oid: fill.oid,
                })
            }
            RawOrderStatus::Resting(resting) => Ok(OrderStatus::Resting { oid: resting.oid }),
            RawOrderStatus::Error(message) => Ok(OrderStatus::Error(message)),
        }
    }
}

/// Extract the single order status from an order reply.
///
/// Every order here is submitted alone, so exactly one status is expected.
pub fn single_order_status(response: RawExchangeResponse) -> ExchangeResult<OrderStatus> {
    match response {
        RawExchangeResponse::Err(message) => Err(ExchangeError::from_rejection(message)),
        RawExchangeResponse::Ok(ok) => {
            let mut statuses = ok
                .data
                .ok_or_else(|| {
                    ExchangeError::UnexpectedResponse("order reply without data".to_string())
                })?
                .statuses;
            if statuses.len() != 1 {
                return Err(ExchangeError::UnexpectedResponse(format!(
                    "expected 1 order status, got {}",
                    statuses.len()
                )));
            }
            OrderStatus::parse(statuses.remove(0))
        }
    }
}

/// Check that a non-order action (leverage update, approval) was accepted.
pub fn require_ok(response: RawExchangeResponse) -> ExchangeResult<()> {
    match response {
        RawExchangeResponse::Ok(_) => Ok(()),
        RawExchangeResponse::Err(message) => Err(ExchangeError::from_rejection(message)),
    }
}
