// ============================================================================
// Price/Time Priority Matching Algorithm (FIFO)
// ============================================================================

use crate::domain::{BookResult, Order, OrderBookSide, OrderIndex, Trade};
use crate::interfaces::MatchingAlgorithm;

/// Price/Time Priority (FIFO) matching algorithm
///
/// The best-ranked resting order is popped, traded at its own price, and put
/// back under its original key if anything is left. Orders at the same price
/// therefore trade strictly in arrival order, and a partially filled order
/// keeps its seniority.
///
/// # Example
/// ```text
/// Book:  101 @ 8 (Order A, seq=1)
///        102 @ 10 (Order B, seq=2)
///
/// Incoming: Market buy 12
/// Result: 8 @ 101 with A, then 4 @ 102 with B; B rests with 6
/// ```
#[derive(Debug, Default)]
pub struct PriceTimePriority;

impl PriceTimePriority {
    pub fn new() -> Self {
        Self
    }
}

impl MatchingAlgorithm for PriceTimePriority {
    fn match_order(
        &self,
        incoming_order: &mut Order,
        opposite_side: &OrderBookSide,
        index: &mut OrderIndex,
    ) -> BookResult<Vec<Trade>> {
        let mut trades = Vec::new();

        while incoming_order.remaining_quantity() > 0 {
            let best_price = match opposite_side.best_price() {
                Some(price) => price,
                None => break,
            };

            if !self.prices_cross(incoming_order, best_price) {
                break;
            }

            let (key, maker_order) = match opposite_side.pop_best() {
                Some(best) => best,
                None => break,
            };
            index.remove(&maker_order.id);

            let trade_quantity = incoming_order
                .remaining_quantity()
                .min(maker_order.remaining_quantity());

            let mut filled_maker = maker_order.clone();
            if let Err(err) = filled_maker
                .fill(trade_quantity)
                .and_then(|()| incoming_order.fill(trade_quantity))
            {
                // Put the untouched maker back so structure and index agree
                index.insert(maker_order.id, key);
                opposite_side.insert(maker_order);
                return Err(err);
            }

            tracing::trace!(
                maker = %filled_maker.id,
                taker = %incoming_order.id,
                price = %key.price,
                quantity = trade_quantity,
                "fill"
            );

            trades.push(Trade::new(
                filled_maker.id,
                incoming_order.id,
                incoming_order.side,
                key.price,
                trade_quantity,
            ));

            if filled_maker.remaining_quantity() > 0 {
                index.insert(filled_maker.id, key);
                opposite_side.insert(filled_maker);
            } else {
                index.retire(&filled_maker);
            }
        }

        Ok(trades)
    }

    fn name(&self) -> &str {
        "PriceTime"
    }
}
