// ============================================================================
// Order Ranking
// Price-time priority keys for the bid and ask structures
// ============================================================================

use super::order::{Order, Price, Side};
use std::cmp::Ordering;

/// Position of a resting order inside its side's priority structure.
///
/// The ordering is total and the smallest key is always the order that should
/// trade next:
/// - Buy: higher price first, then earlier arrival
/// - Sell: lower price first, then earlier arrival
///
/// Arrival is the book's logical sequence, so two orders at the same price can
/// never tie. A partially filled order keeps its key when re-inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriorityKey {
    pub side: Side,
    pub price: Price,
    pub sequence: u64,
}

impl PriorityKey {
    pub fn new(side: Side, price: Price, sequence: u64) -> Self {
        Self {
            side,
            price,
            sequence,
        }
    }

    /// Key for a limit order; market orders never rest and have no key.
    pub fn for_order(order: &Order) -> Option<Self> {
        order
            .price
            .map(|price| Self::new(order.side, price, order.sequence))
    }

    fn side_rank(&self) -> u8 {
        match self.side {
            Side::Buy => 0,
            Side::Sell => 1,
        }
    }
}

impl Ord for PriorityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Keys of different sides never share a structure; ranking them by side
        // keeps the order total.
        self.side_rank()
            .cmp(&other.side_rank())
            .then_with(|| match self.side {
                Side::Buy => other.price.cmp(&self.price),
                Side::Sell => self.price.cmp(&other.price),
            })
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for PriorityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
