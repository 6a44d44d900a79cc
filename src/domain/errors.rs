// ============================================================================
// Book Errors
// Error taxonomy for order validation, cancellation and book invariants
// ============================================================================

use super::order::state::{OrderState, OrderStateTransition};
use super::order::{OrderId, Price, Quantity};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why an order was refused before touching the book.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RejectReason {
    #[error("price must be positive")]
    NonPositivePrice,

    #[error("quantity must be positive")]
    ZeroQuantity,

    #[error("limit orders must have a price")]
    MissingLimitPrice,

    #[error("price {price} is not a multiple of tick size {tick_size}")]
    OffTick { price: Price, tick_size: Price },

    #[error("order would cross the book")]
    WouldCrossBook,

    #[error("market orders cannot rest in the book")]
    MarketOrderCannotRest,
}

/// Errors produced by the order book and matching engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookError {
    /// Validation failure, returned synchronously and never retried by the book
    #[error("invalid order: {reason}")]
    InvalidOrder { reason: RejectReason },

    /// Cancel target was never seen or has already reached a terminal state
    #[error("unknown order {order_id} (last known state: {last_known_state:?})")]
    UnknownOrder {
        order_id: OrderId,
        last_known_state: Option<OrderState>,
    },

    /// Best bid at or above best ask after a completed operation. Always a defect.
    #[error("crossed book invariant violated: best bid {best_bid} >= best ask {best_ask}")]
    CrossedBook { best_bid: Price, best_ask: Price },

    #[error("invalid transition for order {order_id} from {from:?} via {via:?}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderState,
        via: OrderStateTransition,
    },

    #[error("cannot fill {requested} on order {order_id} with {remaining} remaining")]
    Overfill {
        order_id: OrderId,
        requested: Quantity,
        remaining: Quantity,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<RejectReason> for BookError {
    fn from(reason: RejectReason) -> Self {
        BookError::InvalidOrder { reason }
    }
}

/// Result type alias for book operations
pub type BookResult<T> = Result<T, BookError>;
