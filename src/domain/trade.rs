// ============================================================================
// Trade Domain Model
// ============================================================================

use chrono::{DateTime, Utc};

use super::{OrderId, Price, Quantity, Side};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Represents a matched trade between two orders
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trade {
    /// Per-book trade sequence, assigned by the engine in execution order
    pub id: u64,

    /// Order ID of the passive order (resting in book)
    pub maker_order_id: OrderId,

    /// Order ID of the aggressive order (incoming)
    pub taker_order_id: OrderId,

    /// Side of the incoming order
    pub taker_side: Side,

    /// Execution price, always the resting order's price
    pub price: Price,

    /// Executed quantity
    pub quantity: Quantity,

    /// Trade timestamp
    pub timestamp: DateTime<Utc>,
}

impl Trade {
    pub fn new(
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        taker_side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            id: 0,
            maker_order_id,
            taker_order_id,
            taker_side,
            price,
            quantity,
            timestamp: Utc::now(),
        }
    }

    /// Calculate the notional value of the trade (price * quantity), `None`
    /// if it does not fit in a `Decimal`
    pub fn notional_value(&self) -> Option<Price> {
        self.price.checked_mul(Price::from(self.quantity))
    }

    /// Whether `order_id` took part in this trade on either side
    pub fn involves(&self, order_id: OrderId) -> bool {
        self.maker_order_id == order_id || self.taker_order_id == order_id
    }
}
