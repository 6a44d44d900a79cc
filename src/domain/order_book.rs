// ============================================================================
// Order Book Domain Model
// ============================================================================

use crossbeam_skiplist::SkipMap;
use std::collections::HashMap;

use super::order::state::OrderState;
use super::priority::PriorityKey;
use super::{Order, OrderId, Price, Quantity, Side};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Order Book Side
// ============================================================================

/// One side of the book (bids or asks).
///
/// Uses a skip list keyed by [`PriorityKey`], so the front entry is always
/// the best-ranked resting order and arbitrary removal is O(log n).
pub struct OrderBookSide {
    pub side: Side,
    orders: SkipMap<PriorityKey, Order>,
}

impl OrderBookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            orders: SkipMap::new(),
        }
    }

    /// Rest an order on this side. Returns its key, or `None` for orders
    /// that cannot rest (market orders, wrong side).
    pub fn insert(&self, order: Order) -> Option<PriorityKey> {
        if order.side != self.side {
            return None;
        }
        let key = PriorityKey::for_order(&order)?;
        self.orders.insert(key, order);
        Some(key)
    }

    /// Remove and return the best-ranked order
    pub fn pop_best(&self) -> Option<(PriorityKey, Order)> {
        self.orders
            .pop_front()
            .map(|entry| (*entry.key(), entry.value().clone()))
    }

    pub fn peek_best(&self) -> Option<(PriorityKey, Order)> {
        self.orders
            .front()
            .map(|entry| (*entry.key(), entry.value().clone()))
    }

    pub fn remove(&self, key: &PriorityKey) -> Option<Order> {
        self.orders.remove(key).map(|entry| entry.value().clone())
    }

    pub fn get(&self, key: &PriorityKey) -> Option<Order> {
        self.orders.get(key).map(|entry| entry.value().clone())
    }

    /// Get the best (top-of-book) price
    pub fn best_price(&self) -> Option<Price> {
        self.orders.front().map(|entry| entry.key().price)
    }

    pub fn best_order_id(&self) -> Option<OrderId> {
        self.orders.front().map(|entry| entry.value().id)
    }

    /// Aggregate resting quantity by price, best `num_levels` levels first.
    /// Level totals saturate at `Quantity::MAX`.
    pub fn depth(&self, num_levels: usize) -> Vec<(Price, Quantity)> {
        let mut levels: Vec<(Price, Quantity)> = Vec::with_capacity(num_levels.min(self.orders.len()));

        for entry in self.orders.iter() {
            let price = entry.key().price;
            let quantity = entry.value().remaining_quantity();

            match levels.last_mut() {
                Some((level_price, total)) if *level_price == price => {
                    *total = total.saturating_add(quantity)
                },
                _ => {
                    if levels.len() == num_levels {
                        break;
                    }
                    levels.push((price, quantity));
                },
            }
        }

        levels
    }

    /// Resting quantity on this side, saturating at `Quantity::MAX`
    pub fn total_quantity(&self) -> Quantity {
        self.orders
            .iter()
            .map(|entry| entry.value().remaining_quantity())
            .fold(0, Quantity::saturating_add)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

// ============================================================================
// Order Index
// ============================================================================

/// Maps order ids to their place in the book.
///
/// Live orders map to their [`PriorityKey`]; orders that reached a terminal
/// state are kept separately so status queries and repeated cancels can be
/// answered without the order being resting anywhere.
#[derive(Debug, Default)]
pub struct OrderIndex {
    live: HashMap<OrderId, PriorityKey>,
    finished: HashMap<OrderId, RetiredOrder>,
}

/// What the index remembers about an order after it left the book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetiredOrder {
    pub state: OrderState,
    pub filled_quantity: Quantity,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, order_id: OrderId, key: PriorityKey) {
        self.live.insert(order_id, key);
    }

    pub fn remove(&mut self, order_id: &OrderId) -> Option<PriorityKey> {
        self.live.remove(order_id)
    }

    pub fn locate(&self, order_id: &OrderId) -> Option<PriorityKey> {
        self.live.get(order_id).copied()
    }

    /// Record the terminal state of an order that has left the book
    pub fn retire(&mut self, order: &Order) {
        debug_assert!(order.state().is_terminal());
        self.live.remove(&order.id);
        self.finished.insert(
            order.id,
            RetiredOrder {
                state: order.state(),
                filled_quantity: order.filled_quantity(),
            },
        );
    }

    pub fn retired(&self, order_id: &OrderId) -> Option<RetiredOrder> {
        self.finished.get(order_id).copied()
    }

    pub fn terminal_state(&self, order_id: &OrderId) -> Option<OrderState> {
        self.finished.get(order_id).map(|retired| retired.state)
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.live.contains_key(order_id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

// ============================================================================
// Top Of Book
// ============================================================================

/// Best bid and best ask at a single point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TopOfBook {
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
}

impl TopOfBook {
    pub fn new(best_bid: Option<Price>, best_ask: Option<Price>) -> Self {
        Self { best_bid, best_ask }
    }

    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid, self.best_ask) {
            (Some(bid), Some(ask)) => ask.checked_sub(bid),
            _ => None,
        }
    }

    /// Halfway between bid and ask, computed from the spread so prices near
    /// `Decimal::MAX` do not overflow
    pub fn mid_price(&self) -> Option<Price> {
        let half_spread = self.spread()?.checked_div(Price::TWO)?;
        self.best_bid?.checked_add(half_spread)
    }

    pub fn is_crossed(&self) -> bool {
        matches!((self.best_bid, self.best_ask), (Some(bid), Some(ask)) if bid >= ask)
    }
}

// ============================================================================
// Order Book Snapshot
// ============================================================================

/// Immutable snapshot of the order book state
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderBookSnapshot {
    pub instrument: String,
    /// Bid levels (price, quantity), best first
    pub bids: Vec<(Price, Quantity)>,
    /// Ask levels (price, quantity), best first
    pub asks: Vec<(Price, Quantity)>,
    /// Current spread (ask - bid)
    pub spread: Option<Price>,
    /// Mid price
    pub mid_price: Option<Price>,
}

impl OrderBookSnapshot {
    pub fn with_depth(
        instrument: String,
        bids: Vec<(Price, Quantity)>,
        asks: Vec<(Price, Quantity)>,
    ) -> Self {
        let top = TopOfBook::new(
            bids.first().map(|(price, _)| *price),
            asks.first().map(|(price, _)| *price),
        );

        Self {
            instrument,
            bids,
            asks,
            spread: top.spread(),
            mid_price: top.mid_price(),
        }
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|(price, _)| *price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|(price, _)| *price)
    }

    pub fn total_bid_quantity(&self) -> Quantity {
        self.bids
            .iter()
            .map(|(_, qty)| *qty)
            .fold(0, Quantity::saturating_add)
    }

    pub fn total_ask_quantity(&self) -> Quantity {
        self.asks
            .iter()
            .map(|(_, qty)| *qty)
            .fold(0, Quantity::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn order(id: u64, side: Side, price: Price, quantity: Quantity) -> Order {
        Order::limit(OrderId::new(id), side, price, quantity, id)
    }

    #[test]
    fn test_order_book_side_best_price() {
        let bids = OrderBookSide::new(Side::Buy);
        bids.insert(order(1, Side::Buy, dec!(99), 1));
        bids.insert(order(2, Side::Buy, dec!(101), 1));
        bids.insert(order(3, Side::Buy, dec!(100), 1));
        assert_eq!(bids.best_price(), Some(dec!(101)));

        let asks = OrderBookSide::new(Side::Sell);
        asks.insert(order(4, Side::Sell, dec!(103), 1));
        asks.insert(order(5, Side::Sell, dec!(102), 1));
        assert_eq!(asks.best_price(), Some(dec!(102)));
    }

    #[test]
    fn test_pop_best_respects_fifo() {
        let asks = OrderBookSide::new(Side::Sell);
        asks.insert(order(1, Side::Sell, dec!(100), 5));
        asks.insert(order(2, Side::Sell, dec!(100), 5));

        let (_, first) = asks.pop_best().unwrap();
        let (_, second) = asks.pop_best().unwrap();
        assert_eq!(first.id, OrderId::new(1));
        assert_eq!(second.id, OrderId::new(2));
        assert!(asks.pop_best().is_none());
    }

    #[test]
    fn test_rejects_market_and_wrong_side() {
        let bids = OrderBookSide::new(Side::Buy);
        assert!(bids
            .insert(Order::market(OrderId::new(1), Side::Buy, 5, 1))
            .is_none());
        assert!(bids.insert(order(2, Side::Sell, dec!(100), 5)).is_none());
        assert!(bids.is_empty());
    }

    #[test]
    fn test_remove_by_key() {
        let bids = OrderBookSide::new(Side::Buy);
        let key = bids.insert(order(1, Side::Buy, dec!(100), 5)).unwrap();
        bids.insert(order(2, Side::Buy, dec!(99), 5));

        let removed = bids.remove(&key).unwrap();
        assert_eq!(removed.id, OrderId::new(1));
        assert_eq!(bids.best_price(), Some(dec!(99)));
        assert!(bids.remove(&key).is_none());
    }

    #[test]
    fn test_depth_aggregates_levels() {
        let asks = OrderBookSide::new(Side::Sell);
        asks.insert(order(1, Side::Sell, dec!(101), 8));
        asks.insert(order(2, Side::Sell, dec!(102), 10));
        asks.insert(order(3, Side::Sell, dec!(101), 2));
        asks.insert(order(4, Side::Sell, dec!(105), 1));

        assert_eq!(
            asks.depth(2),
            vec![(dec!(101), 10), (dec!(102), 10)]
        );
        assert_eq!(asks.depth(10).len(), 3);
        assert!(asks.depth(0).is_empty());
        assert_eq!(asks.total_quantity(), 21);
        assert_eq!(asks.len(), 4);
    }

    #[test]
    fn test_index_retire() {
        let mut index = OrderIndex::new();
        let mut resting = order(1, Side::Buy, dec!(100), 5);
        let key = PriorityKey::for_order(&resting).unwrap();
        index.insert(resting.id, key);
        assert_eq!(index.locate(&resting.id), Some(key));

        resting.fill(2).unwrap();
        resting.cancel().unwrap();
        index.retire(&resting);

        assert!(!index.contains(&resting.id));
        assert_eq!(
            index.retired(&resting.id),
            Some(RetiredOrder {
                state: OrderState::Cancelled,
                filled_quantity: 2,
            })
        );
        assert_eq!(index.live_count(), 0);
    }

    #[test]
    fn test_top_of_book() {
        let top = TopOfBook::new(Some(dec!(99)), Some(dec!(101)));
        assert_eq!(top.spread(), Some(dec!(2)));
        assert_eq!(top.mid_price(), Some(dec!(100)));
        assert!(!top.is_crossed());
        assert!(TopOfBook::new(Some(dec!(101)), Some(dec!(101))).is_crossed());
        assert_eq!(TopOfBook::default().spread(), None);
    }

    #[test]
    fn test_order_book_snapshot() {
        let snapshot = OrderBookSnapshot::with_depth(
            "SIM".to_string(),
            vec![(dec!(50000), 1)],
            vec![(dec!(50100), 2)],
        );

        assert_eq!(snapshot.best_bid(), Some(dec!(50000)));
        assert_eq!(snapshot.best_ask(), Some(dec!(50100)));
        assert_eq!(snapshot.spread, Some(dec!(100)));
        assert_eq!(snapshot.mid_price, Some(dec!(50050)));
        assert_eq!(snapshot.total_ask_quantity(), 2);
    }

    #[test]
    fn test_aggregates_saturate_instead_of_overflowing() {
        let asks = OrderBookSide::new(Side::Sell);
        asks.insert(Order::limit(OrderId::new(1), Side::Sell, dec!(100), u64::MAX, 1));
        asks.insert(Order::limit(OrderId::new(2), Side::Sell, dec!(100), 1, 2));
        asks.insert(Order::limit(OrderId::new(3), Side::Sell, dec!(101), 7, 3));

        assert_eq!(asks.depth(5), vec![(dec!(100), u64::MAX), (dec!(101), 7)]);
        assert_eq!(asks.total_quantity(), u64::MAX);

        let snapshot = OrderBookSnapshot::with_depth("SIM".to_string(), Vec::new(), asks.depth(5));
        assert_eq!(snapshot.total_ask_quantity(), u64::MAX);
    }

    #[test]
    fn test_mid_price_near_decimal_max() {
        let bid = Decimal::MAX - Decimal::TWO;
        let top = TopOfBook::new(Some(bid), Some(Decimal::MAX));
        assert_eq!(top.spread(), Some(Decimal::TWO));
        assert_eq!(top.mid_price(), Some(Decimal::MAX - Decimal::ONE));

        // Odd spread at the top of the range: no panic, and any mid stays inside
        let bid = Decimal::MAX - Decimal::ONE;
        let snapshot =
            OrderBookSnapshot::with_depth("SIM".to_string(), vec![(bid, 1)], vec![(Decimal::MAX, 1)]);
        assert_eq!(snapshot.spread, Some(Decimal::ONE));
        if let Some(mid) = snapshot.mid_price {
            assert!(bid <= mid && mid <= Decimal::MAX);
        }
    }
}
