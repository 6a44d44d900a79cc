// ============================================================================
// Matching Algorithm Interface
// Defines the contract for the matching pass run against one side of the book
// ============================================================================

use crate::domain::{BookResult, Order, OrderBookSide, OrderIndex, Price, Side, Trade};

/// Strategy pattern interface for matching algorithms
pub trait MatchingAlgorithm: Send + Sync {
    /// Match an incoming order against the opposite side of the book
    ///
    /// # Arguments
    /// * `incoming_order` - The new order to match; its remaining quantity is
    ///   decremented in place
    /// * `opposite_side` - The opposite side of the order book
    /// * `index` - Order index covering `opposite_side`
    ///
    /// # Returns
    /// Trades in execution order. The caller holds the book's write lock for
    /// the whole pass.
    fn match_order(
        &self,
        incoming_order: &mut Order,
        opposite_side: &OrderBookSide,
        index: &mut OrderIndex,
    ) -> BookResult<Vec<Trade>>;

    /// Get the algorithm name for logging
    fn name(&self) -> &str;

    /// Check if the incoming order reaches a resting price.
    /// Market orders cross any price.
    fn prices_cross(&self, incoming: &Order, book_price: Price) -> bool {
        match (incoming.side, incoming.price) {
            (_, None) => true,
            (Side::Buy, Some(limit)) => limit >= book_price,
            (Side::Sell, Some(limit)) => limit <= book_price,
        }
    }
}
