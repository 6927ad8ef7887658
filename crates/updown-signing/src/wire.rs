//! Signature wire envelope.

use alloy::primitives::PrimitiveSignature;
use serde::Serialize;

/// Signature as the exchange expects it: hex `r`/`s` and a 27/28 `v`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureWire {
    pub r: String,
    pub s: String,
    pub v: u64,
}

impl From<&PrimitiveSignature> for SignatureWire {
    fn from(sig: &PrimitiveSignature) -> Self {
        Self {
            r: format!("0x{}", hex::encode(sig.r().to_be_bytes::<32>())),
            s: format!("0x{}", hex::encode(sig.s().to_be_bytes::<32>())),
            v: if sig.v() { 28 } else { 27 },
        }
    }
}
