// ============================================================================
// Spread Quoter
// Fixed-spread market maker with size slippage and inventory limits
// ============================================================================

use super::{FillReport, MarketView, Position, Quote, QuoteStrategy, Quotes};
use crate::domain::{BookError, BookResult, Price, Quantity, Side};
use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the spread quoter
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuoterConfig {
    /// Full relative spread, e.g. 0.02 quotes 1% either side
    pub spread: Decimal,
    /// Absolute inventory the quoter will not exceed
    pub inventory_limit: Quantity,
    /// Execution price penalty per unit of `quantity / inventory_limit`
    pub slippage_factor: Decimal,
    /// Size of each quote
    pub quote_quantity: Quantity,
    /// Price quoted around when the book has no two-sided market
    pub fallback_price: Price,
    pub starting_cash: Decimal,
}

impl Default for QuoterConfig {
    fn default() -> Self {
        Self {
            spread: Decimal::new(2, 2),
            inventory_limit: 100,
            slippage_factor: Decimal::new(1, 3),
            quote_quantity: 10,
            fallback_price: Decimal::from(100),
            starting_cash: Decimal::from(100_000),
        }
    }
}

impl QuoterConfig {
    pub fn with_spread(mut self, spread: Decimal) -> Self {
        self.spread = spread;
        self
    }

    pub fn with_quote_quantity(mut self, quantity: Quantity) -> Self {
        self.quote_quantity = quantity;
        self
    }

    pub fn validate(&self) -> BookResult<()> {
        if self.spread <= Decimal::ZERO || self.spread >= Decimal::TWO {
            return Err(BookError::InvalidConfig(
                "spread must be in (0, 2)".to_string(),
            ));
        }
        if self.inventory_limit == 0 || self.quote_quantity == 0 {
            return Err(BookError::InvalidConfig(
                "inventory limit and quote quantity must be positive".to_string(),
            ));
        }
        if self.slippage_factor < Decimal::ZERO {
            return Err(BookError::InvalidConfig(
                "slippage factor cannot be negative".to_string(),
            ));
        }
        if self.fallback_price <= Decimal::ZERO {
            return Err(BookError::InvalidConfig(
                "fallback price must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Quotes a fixed spread outside the current top of book
pub struct SpreadQuoter {
    config: QuoterConfig,
    spread: Decimal,
    position: Position,
}

impl SpreadQuoter {
    pub fn new(config: QuoterConfig) -> BookResult<Self> {
        config.validate()?;
        Ok(Self {
            spread: config.spread,
            position: Position {
                inventory: 0,
                cash: config.starting_cash,
            },
            config,
        })
    }

    pub fn config(&self) -> &QuoterConfig {
        &self.config
    }

    pub fn spread(&self) -> Decimal {
        self.spread
    }

    pub fn set_spread(&mut self, spread: Decimal) {
        self.spread = spread;
    }

    /// Price actually paid or received for a fill of `quantity`
    pub fn apply_slippage(&self, price: Price, quantity: Quantity) -> Price {
        let size_ratio = Decimal::from(quantity) / Decimal::from(self.config.inventory_limit);
        price * (Decimal::ONE + self.config.slippage_factor * size_ratio)
    }

    fn can_take(&self, side: Side, quantity: Quantity) -> bool {
        let limit = i64::try_from(self.config.inventory_limit).unwrap_or(i64::MAX);
        let quantity = i64::try_from(quantity).unwrap_or(i64::MAX);
        match side {
            Side::Buy => self.position.inventory.saturating_add(quantity) <= limit,
            Side::Sell => self.position.inventory.saturating_sub(quantity) >= -limit,
        }
    }
}

impl QuoteStrategy for SpreadQuoter {
    fn decide_quotes(&mut self, market: &MarketView) -> Quotes {
        let half_spread = self.spread / Decimal::TWO;
        let (bid_anchor, ask_anchor) = match (market.top.best_bid, market.top.best_ask) {
            (Some(bid), Some(ask)) => (bid, ask),
            _ => (market.reference_price, market.reference_price),
        };

        let bid_price = (bid_anchor * (Decimal::ONE - half_spread)).round_dp(2);
        let ask_price = (ask_anchor * (Decimal::ONE + half_spread)).round_dp(2);
        let quantity = self.config.quote_quantity;

        if bid_price <= Decimal::ZERO || bid_price >= ask_price {
            return Quotes::default();
        }

        Quotes {
            bid: self.can_take(Side::Buy, quantity).then_some(Quote {
                price: bid_price,
                quantity,
            }),
            ask: self.can_take(Side::Sell, quantity).then_some(Quote {
                price: ask_price,
                quantity,
            }),
        }
    }

    fn on_fill(&mut self, fill: &FillReport) {
        let executed_price = self.apply_slippage(fill.price, fill.quantity);
        let notional = executed_price * Decimal::from(fill.quantity);
        let quantity = i64::try_from(fill.quantity).unwrap_or(i64::MAX);

        match fill.side {
            Side::Buy => {
                self.position.inventory = self.position.inventory.saturating_add(quantity);
                self.position.cash -= notional;
            },
            Side::Sell => {
                self.position.inventory = self.position.inventory.saturating_sub(quantity);
                self.position.cash += notional;
            },
        }

        tracing::debug!(
            side = ?fill.side,
            quantity = fill.quantity,
            price = %executed_price,
            inventory = self.position.inventory,
            "quote filled"
        );
    }

    fn position(&self) -> Position {
        self.position
    }

    fn name(&self) -> &str {
        "SpreadQuoter"
    }
}
