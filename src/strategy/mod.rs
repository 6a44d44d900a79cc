// ============================================================================
// Strategy Module
// Quoting strategies that consume the book through its public interface
// ============================================================================

mod q_learning;
mod spread_quoter;

pub use q_learning::{QLearningConfig, QLearningQuoter, SpreadAction};
pub use spread_quoter::{QuoterConfig, SpreadQuoter};

use crate::domain::{OrderId, Price, Quantity, Side, TopOfBook};
use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What a strategy sees of the market at one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketView {
    pub top: TopOfBook,
    /// Mid price when both sides exist, otherwise the last known price
    pub reference_price: Price,
    /// Dispersion of resting bid prices
    pub volatility: Decimal,
}

/// One side of a two-sided quote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Quote {
    pub price: Price,
    pub quantity: Quantity,
}

/// Desired resting orders for the next step. A side is `None` when the
/// strategy declines to quote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Quotes {
    pub bid: Option<Quote>,
    pub ask: Option<Quote>,
}

/// A fill on one of the strategy's own orders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillReport {
    pub order_id: OrderId,
    /// Side of the strategy's order
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

/// Inventory and cash held by a strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    /// Signed units held, negative when short
    pub inventory: i64,
    pub cash: Decimal,
}

impl Position {
    /// Cash plus inventory marked at `mark`. Inventory counts as zero without a
    /// mark.
    pub fn equity(&self, mark: Option<Price>) -> Decimal {
        match mark {
            Some(price) => self.cash + price * Decimal::from(self.inventory),
            None => self.cash,
        }
    }
}

/// Quote generation and fill accounting for one market-making variant.
///
/// Variants are independent types; a variant that refines another holds it
/// as a field rather than extending it.
pub trait QuoteStrategy: Send {
    /// Quotes to rest for the coming step
    fn decide_quotes(&mut self, market: &MarketView) -> Quotes;

    /// Called once per fill on an order the strategy placed
    fn on_fill(&mut self, fill: &FillReport);

    /// Called after the step's fills have been delivered
    fn on_step_end(&mut self, _market: &MarketView) {}

    fn position(&self) -> Position;

    fn name(&self) -> &str;
}
