//! Position and realized-outcome types.
//!
//! A `Position` is the single source of truth for one in-flight bet, created
//! when the open order fills (or rests) and mutated only when the lifecycle
//! scheduler closes it.

use crate::{ClientOrderId, Direction, Price, Size};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final outcome of a closed bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeResult {
    Win,
    Loss,
}

impl TradeResult {
    pub fn is_win(&self) -> bool {
        matches!(self, Self::Win)
    }

    /// Outcome from entry/exit prices. An exactly unchanged price counts
    /// as a loss.
    pub fn from_prices(direction: Direction, entry: Price, exit: Price) -> Self {
        let won = match direction {
            Direction::Up => exit > entry,
            Direction::Down => exit < entry,
        };
        if won {
            Self::Win
        } else {
            Self::Loss
        }
    }
}

impl fmt::Display for TradeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Win => write!(f, "win"),
            Self::Loss => write!(f, "loss"),
        }
    }
}

/// One leveraged, time-boxed bet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Client order id of the opening order; the registry key.
    pub cloid: ClientOrderId,
    /// Exchange-assigned order id, when known.
    pub oid: Option<u64>,
    /// Coin symbol.
    pub asset: String,
    /// Bet direction.
    pub direction: Direction,
    /// Actual entry price (fill price, not the requested limit).
    pub entry_price: Price,
    /// Actual position size (fill size, not the requested size).
    pub size: Size,
    /// Margin committed when the bet was placed; used to recompute a close
    /// size if the fill size is missing.
    pub margin: Decimal,
    /// Leverage applied at open.
    pub leverage: u32,
    /// Whether the open order filled immediately (false = rested).
    pub filled: bool,
    /// Unix ms when the position was opened.
    pub opened_at_ms: u64,
    /// Game duration in milliseconds.
    pub duration_ms: u64,
    /// Set once the scheduler has closed the position.
    pub closed: bool,
    /// Exit price, once closed.
    pub exit_price: Option<Price>,
    /// Win/loss, once closed.
    pub result: Option<TradeResult>,
    /// Realized profit and loss, once closed.
    pub pnl: Option<Pnl>,
}

impl Position {
    /// Mark the position closed with its final exit price, result and
    /// realized PnL.
    pub fn settle(&mut self, exit_price: Price, result: TradeResult) {
        self.closed = true;
        self.exit_price = Some(exit_price);
        self.result = Some(result);
        self.pnl = Some(Pnl::compute(
            self.direction,
            self.entry_price,
            exit_price,
            self.size,
        ));
    }
}

/// Realized profit and loss for a closed position.
///
/// Sign flips for short positions: direction=down profits when
/// exit < entry, direction=up the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pnl {
    /// Realized USD value; negative on losses.
    pub dollar_value: Decimal,
    /// Signed percentage move of the entry notional.
    pub percent: Decimal,
    /// Whether this counts as a win (zero movement is a loss).
    pub is_win: bool,
}

impl Pnl {
    /// Derive PnL from the entry/exit prices of a position.
    pub fn compute(direction: Direction, entry: Price, exit: Price, size: Size) -> Self {
        let raw = (exit.inner() - entry.inner()) * size.inner();
        let dollar_value = raw * Decimal::from(direction.sign());

        let percent = exit
            .pct_from(entry)
            .map(|p| p * Decimal::from(direction.sign()))
            .unwrap_or(Decimal::ZERO);

        Self {
            dollar_value,
            percent,
            is_win: TradeResult::from_prices(direction, entry, exit).is_win(),
        }
    }
}
