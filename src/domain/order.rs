// ============================================================================
// Order Domain Model
// ============================================================================

use super::errors::{BookError, BookResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Limit prices and execution prices
pub type Price = Decimal;

/// Order sizes are whole units
pub type Quantity = u64;

// ============================================================================
// Value Objects
// ============================================================================

/// Book-assigned order identifier. Strictly increasing per book, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderId(u64);

impl OrderId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrderType {
    Limit,
    Market,
}

// ============================================================================
// Order State Machine
// ============================================================================

pub mod state {
    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub enum OrderState {
        Active,
        PartiallyFilled,
        Filled,
        Cancelled,
    }

    impl OrderState {
        pub fn is_terminal(&self) -> bool {
            matches!(self, OrderState::Filled | OrderState::Cancelled)
        }

        pub fn can_be_cancelled(&self) -> bool {
            matches!(self, OrderState::Active | OrderState::PartiallyFilled)
        }
    }

    /// Valid state transitions for the order state machine
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub enum OrderStateTransition {
        PartialFill,
        Fill,
        Cancel,
    }

    impl OrderState {
        pub fn transition(&self, transition: OrderStateTransition) -> Option<OrderState> {
            match (self, transition) {
                (OrderState::Active, OrderStateTransition::PartialFill) => {
                    Some(OrderState::PartiallyFilled)
                },
                (OrderState::Active, OrderStateTransition::Fill) => Some(OrderState::Filled),
                (OrderState::Active, OrderStateTransition::Cancel) => Some(OrderState::Cancelled),

                (OrderState::PartiallyFilled, OrderStateTransition::PartialFill) => {
                    Some(OrderState::PartiallyFilled)
                },
                (OrderState::PartiallyFilled, OrderStateTransition::Fill) => {
                    Some(OrderState::Filled)
                },
                (OrderState::PartiallyFilled, OrderStateTransition::Cancel) => {
                    Some(OrderState::Cancelled)
                },

                _ => None,
            }
        }
    }
}

use state::{OrderState, OrderStateTransition};

// ============================================================================
// Order Entity
// ============================================================================

/// An order owned by the book.
///
/// Identity, side, type and limit price never change after creation. Only
/// `remaining_quantity` and `state` move, and only through [`Order::fill`] and
/// [`Order::cancel`], which the matching engine calls under its write lock.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub order_type: OrderType,
    /// `None` for market orders (unbounded in the crossing direction)
    pub price: Option<Price>,
    /// Size at creation
    pub quantity: Quantity,
    /// Logical arrival clock, the FIFO tie-break
    pub sequence: u64,
    /// Wall-clock receipt time, informational only
    pub timestamp: DateTime<Utc>,

    remaining_quantity: Quantity,
    state: OrderState,
}

impl Order {
    pub fn new(
        id: OrderId,
        side: Side,
        order_type: OrderType,
        price: Option<Price>,
        quantity: Quantity,
        sequence: u64,
    ) -> Self {
        Self {
            id,
            side,
            order_type,
            price,
            quantity,
            sequence,
            timestamp: Utc::now(),
            remaining_quantity: quantity,
            state: OrderState::Active,
        }
    }

    pub fn limit(id: OrderId, side: Side, price: Price, quantity: Quantity, sequence: u64) -> Self {
        Self::new(id, side, OrderType::Limit, Some(price), quantity, sequence)
    }

    pub fn market(id: OrderId, side: Side, quantity: Quantity, sequence: u64) -> Self {
        Self::new(id, side, OrderType::Market, None, quantity, sequence)
    }

    // ========================================================================
    // Getters
    // ========================================================================

    pub fn remaining_quantity(&self) -> Quantity {
        self.remaining_quantity
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.quantity - self.remaining_quantity
    }

    pub fn state(&self) -> OrderState {
        self.state
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    pub fn is_market_order(&self) -> bool {
        matches!(self.order_type, OrderType::Market)
    }

    pub fn is_limit_order(&self) -> bool {
        matches!(self.order_type, OrderType::Limit)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Take `quantity` off the remaining size and advance the state.
    ///
    /// Refuses to over-fill or to touch a terminal order; the order is left
    /// unchanged on error.
    pub fn fill(&mut self, quantity: Quantity) -> BookResult<()> {
        if quantity == 0 || quantity > self.remaining_quantity {
            return Err(BookError::Overfill {
                order_id: self.id,
                requested: quantity,
                remaining: self.remaining_quantity,
            });
        }

        let via = if quantity == self.remaining_quantity {
            OrderStateTransition::Fill
        } else {
            OrderStateTransition::PartialFill
        };
        self.apply(via)?;
        self.remaining_quantity -= quantity;
        Ok(())
    }

    pub fn cancel(&mut self) -> BookResult<()> {
        self.apply(OrderStateTransition::Cancel)
    }

    fn apply(&mut self, via: OrderStateTransition) -> BookResult<()> {
        self.state = self
            .state
            .transition(via)
            .ok_or(BookError::InvalidTransition {
                order_id: self.id,
                from: self.state,
                via,
            })?;
        Ok(())
    }
}
