//! Sizing and limit-price arithmetic shared by order placement and close.

use crate::{AssetConfig, CoreError, Price, Result, Size};
use rust_decimal::Decimal;

/// Basis points denominator.
const BPS: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Position size from a margin budget: `margin * leverage / price`, truncated
/// to the asset's size precision. Truncation never rounds up, so the notional
/// never exceeds the margin budget times leverage.
pub fn position_size(
    config: &AssetConfig,
    margin: Decimal,
    leverage: u32,
    reference_price: Price,
) -> Result<Size> {
    if !reference_price.is_positive() {
        return Err(CoreError::InvalidPrice(format!(
            "reference price must be positive, got {reference_price}"
        )));
    }
    if margin <= Decimal::ZERO {
        return Err(CoreError::InvalidSize(format!(
            "margin must be positive, got {margin}"
        )));
    }

    let raw = margin * Decimal::from(leverage) / reference_price.inner();
    let size = config.truncate_size(Size::new(raw));
    if !size.is_positive() {
        return Err(CoreError::InvalidSize(format!(
            "margin {margin} at {leverage}x buys less than one size step of {}",
            config.name
        )));
    }
    Ok(size)
}

/// Limit price offset through the book so an immediate-or-cancel order
/// crosses the spread: buys pay up, sells give in.
pub fn aggressive_limit(reference_price: Price, is_buy: bool, offset_bps: u32) -> Price {
    let offset = Decimal::from(offset_bps) / BPS;
    let factor = if is_buy {
        Decimal::ONE + offset
    } else {
        Decimal::ONE - offset
    };
    Price::new(reference_price.inner() * factor)
}
