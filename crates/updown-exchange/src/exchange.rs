//! Client for the signed-action trade endpoint.
//!
//! Every request is a JSON envelope `{action, nonce, signature}` where the
//! signature was produced over the canonical hash of the same action and
//! nonce. The action is serialized once to a `Value` so the envelope carries
//! exactly the bytes that were hashed (field order included).

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use updown_core::Network;
use updown_signing::SignatureWire;

use crate::error::{ExchangeError, ExchangeResult};
use crate::response::{require_ok, single_order_status, OrderStatus, RawExchangeResponse};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Signed request envelope for the trade endpoint.
#[derive(Debug, Serialize)]
pub struct ActionEnvelope {
    pub action: Value,
    pub nonce: u64,
    pub signature: SignatureWire,
}

impl ActionEnvelope {
    pub fn new<A: Serialize>(
        action: &A,
        nonce: u64,
        signature: SignatureWire,
    ) -> ExchangeResult<Self> {
        Ok(Self {
            action: serde_json::to_value(action)?,
            nonce,
            signature,
        })
    }
}

/// Client for submitting signed actions.
pub struct ExchangeClient {
    client: Client,
    exchange_url: String,
}

impl ExchangeClient {
    pub fn new(network: Network) -> ExchangeResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ExchangeError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            exchange_url: network.exchange_url().to_string(),
        })
    }

    /// Submit a single order and return its parsed status.
    pub async fn submit_order(&self, envelope: &ActionEnvelope) -> ExchangeResult<OrderStatus> {
        let raw = self.post(envelope).await?;
        single_order_status(raw)
    }

    /// Submit a non-order action (leverage update, agent approval) and
    /// require an ok acknowledgement.
    pub async fn submit_action(&self, envelope: &ActionEnvelope) -> ExchangeResult<()> {
        let raw = self.post(envelope).await?;
        require_ok(raw)
    }

    async fn post(&self, envelope: &ActionEnvelope) -> ExchangeResult<RawExchangeResponse> {
        debug!(url = %self.exchange_url, nonce = envelope.nonce, "Submitting signed action");

        let response = self
            .client
            .post(&self.exchange_url)
            .json(envelope)
            .send()
            .await
            .map_err(|e| ExchangeError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::HttpClient(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            warn!(%status, body = %body, "Trade endpoint returned HTTP error");
            return Err(ExchangeError::HttpClient(format!("HTTP {status}: {body}")));
        }

        serde_json::from_str(&body).map_err(|e| {
            ExchangeError::UnexpectedResponse(format!("unparseable reply ({e}): {body}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use updown_signing::OrderAction;

    #[test]
    fn test_envelope_field_order() {
        let action = OrderAction {
            action_type: "order".to_string(),
            orders: vec![],
            grouping: "na".to_string(),
        };
        let envelope = ActionEnvelope::new(
            &action,
            1_700_000_000_000,
            SignatureWire {
                r: "0x01".to_string(),
                s: "0x02".to_string(),
                v: 27,
            },
        )
        .unwrap();

        let json = serde_json::to_string(&envelope).unwrap();
        // The envelope must carry action, then nonce, then signature, and
        // the action's own fields in their canonical order.
        assert_eq!(
            json,
            r#"{"action":{"type":"order","orders":[],"grouping":"na"},"nonce":1700000000000,"signature":{"r":"0x01","s":"0x02","v":27}}"#
        );
    }
}
