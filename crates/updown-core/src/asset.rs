//! Asset reference data and exchange string-formatting rules.
//!
//! The exchange validates order prices and sizes as strings: prices carry at
//! most 5 significant figures and `6 - sz_decimals` decimal places, sizes at
//! most `sz_decimals` decimal places. Values are truncated toward zero, never
//! rounded up, and trailing zeros are collapsed.

use crate::{Price, Size};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Maximum significant figures accepted in a price string.
pub const MAX_SIG_FIGS: u32 = 5;

/// Perp price decimal budget; actual limit is `MAX_PRICE_DECIMALS - sz_decimals`.
pub const MAX_PRICE_DECIMALS: u32 = 6;

/// Per-asset reference data from the exchange `meta` universe.
///
/// Read-only once fetched; refreshed periodically by the asset registry.
/// Required before sizing or leverage-setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Coin symbol (e.g., "BTC", "ETH").
    pub name: String,

    /// Asset index used in signed actions.
    pub asset_index: u32,

    /// Size decimals (szDecimals). Sizes truncate to this precision.
    pub sz_decimals: u32,

    /// Maximum leverage the exchange allows for this asset.
    pub max_leverage: u32,
}

impl AssetConfig {
    /// Clamp a requested leverage into the asset's allowed range.
    ///
    /// Zero is bumped to 1x; anything above the asset maximum is capped.
    pub fn clamp_leverage(&self, requested: u32) -> u32 {
        requested.clamp(1, self.max_leverage)
    }

    /// Truncate a raw size to the asset's size precision.
    pub fn truncate_size(&self, size: Size) -> Size {
        Size::new(
            size.inner()
                .round_dp_with_strategy(self.sz_decimals, RoundingStrategy::ToZero),
        )
    }

    /// Format a size for order submission.
    pub fn format_size(&self, size: Size) -> String {
        format_wire_decimal(self.truncate_size(size).inner(), self.sz_decimals)
    }

    /// Format a price for order submission.
    ///
    /// Applies the 5-sig-fig and decimal-place constraints by truncation.
    pub fn format_price(&self, price: Price) -> String {
        let max_decimals = MAX_PRICE_DECIMALS.saturating_sub(self.sz_decimals);
        let constrained = truncate_sig_figs(price.inner(), MAX_SIG_FIGS);
        format_wire_decimal(constrained, max_decimals)
    }
}

/// Truncate to at most `sig_figs` significant figures (toward zero).
fn truncate_sig_figs(value: Decimal, sig_figs: u32) -> Decimal {
    value
        .round_sf_with_strategy(sig_figs, RoundingStrategy::ToZero)
        .unwrap_or(value)
}

/// Truncate to `max_decimals` places and render without formatting artifacts.
///
/// `normalize` collapses trailing zeros so "1.100" becomes "1.1" and
/// "1.000" becomes "1", matching the exchange's exact string expectations.
fn format_wire_decimal(value: Decimal, max_decimals: u32) -> String {
    value
        .round_dp_with_strategy(max_decimals, RoundingStrategy::ToZero)
        .normalize()
        .to_string()
}
