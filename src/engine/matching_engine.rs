// ============================================================================
// Matching Engine
// Core business logic for order matching
// ============================================================================

use crate::domain::{
    BookConfig, BookError, BookResult, Order, OrderBookSide, OrderBookSnapshot, OrderId,
    OrderIndex, OrderState, OrderType, Price, Quantity, RejectReason, Side, TopOfBook, Trade,
};
use crate::interfaces::{EventHandler, MatchingAlgorithm, OrderEvent};
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;

// ============================================================================
// Book State
// ============================================================================

/// Everything a mutating operation touches. Lives behind one lock so lookup,
/// matching and structure/index updates form a single critical section.
struct BookState {
    bids: OrderBookSide,
    asks: OrderBookSide,
    index: OrderIndex,
    next_order_id: u64,
    next_sequence: u64,
    next_trade_id: u64,
}

impl BookState {
    fn new() -> Self {
        Self {
            bids: OrderBookSide::new(Side::Buy),
            asks: OrderBookSide::new(Side::Sell),
            index: OrderIndex::new(),
            next_order_id: 1,
            next_sequence: 1,
            next_trade_id: 1,
        }
    }

    fn side(&self, side: Side) -> &OrderBookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn top_of_book(&self) -> TopOfBook {
        TopOfBook::new(self.bids.best_price(), self.asks.best_price())
    }

    /// Next order id and arrival sequence
    fn admit(&mut self) -> (OrderId, u64) {
        let id = OrderId::new(self.next_order_id);
        let sequence = self.next_sequence;
        self.next_order_id += 1;
        self.next_sequence += 1;
        (id, sequence)
    }

    fn rest(&mut self, order: Order) -> BookResult<()> {
        let order_id = order.id;
        let side = match order.side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        let key = side.insert(order).ok_or(BookError::InvalidOrder {
            reason: RejectReason::MarketOrderCannotRest,
        })?;
        self.index.insert(order_id, key);
        Ok(())
    }

    fn status(&self, order_id: &OrderId) -> Option<OrderState> {
        match self.index.locate(order_id) {
            Some(key) => self.side(key.side).get(&key).map(|order| order.state()),
            None => self.index.terminal_state(order_id),
        }
    }
}

// ============================================================================
// Execution Report
// ============================================================================

/// Outcome of one submitted order
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub order_id: OrderId,
    pub side: Side,
    pub order_type: OrderType,
    /// Trades in execution order, each against a worse-or-equal ranked maker
    pub trades: Vec<Trade>,
    pub filled_quantity: Quantity,
    /// Limit remainder now resting in the book
    pub resting_quantity: Quantity,
    /// Market remainder discarded for lack of liquidity
    pub unfilled_quantity: Quantity,
    pub state: OrderState,
}

impl Execution {
    pub fn is_resting(&self) -> bool {
        self.resting_quantity > 0
    }

    /// Volume-weighted execution price, `None` without fills or when the
    /// notional overflows `Decimal`
    pub fn average_price(&self) -> Option<Price> {
        if self.filled_quantity == 0 {
            return None;
        }
        let notional = self
            .trades
            .iter()
            .try_fold(Decimal::ZERO, |total, trade| {
                total.checked_add(trade.notional_value()?)
            })?;
        notional.checked_div(Decimal::from(self.filled_quantity))
    }
}

// ============================================================================
// Matching Engine
// ============================================================================

/// Single-instrument order book with a pluggable matching algorithm.
///
/// All mutations take the write lock for their full duration; queries take the
/// read lock, so they always observe the book between two operations.
pub struct MatchingEngine {
    config: BookConfig,
    state: RwLock<BookState>,
    algorithm: Box<dyn MatchingAlgorithm>,
    event_handler: Arc<dyn EventHandler>,
}

impl MatchingEngine {
    /// Create a new matching engine
    pub fn new(
        config: BookConfig,
        algorithm: Box<dyn MatchingAlgorithm>,
        event_handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            config,
            state: RwLock::new(BookState::new()),
            algorithm,
            event_handler,
        }
    }

    // ========================================================================
    // Order Entry
    // ========================================================================

    /// Rest a limit order without matching.
    ///
    /// Leaves the opposite side untouched: an order that would cross is
    /// rejected with [`RejectReason::WouldCrossBook`] and a market order with
    /// [`RejectReason::MarketOrderCannotRest`]. Use [`Self::submit_order`] to
    /// trade.
    pub fn add_order(
        &self,
        side: Side,
        price: Option<Price>,
        quantity: Quantity,
        order_type: OrderType,
    ) -> BookResult<OrderId> {
        let limit_price = match self.validate(price, quantity, order_type) {
            Ok(Some(limit_price)) => limit_price,
            Ok(None) => return self.reject(side, RejectReason::MarketOrderCannotRest),
            Err(reason) => return self.reject(side, reason),
        };

        let mut events = Vec::with_capacity(2);
        let result = {
            let mut guard = self.state.write();
            let state = &mut *guard;

            let opposite_best = state.side(side.opposite()).best_price();
            let crosses = match (side, opposite_best) {
                (Side::Buy, Some(ask)) => limit_price >= ask,
                (Side::Sell, Some(bid)) => limit_price <= bid,
                (_, None) => false,
            };

            if crosses {
                events.push(OrderEvent::OrderRejected {
                    side,
                    reason: RejectReason::WouldCrossBook,
                    timestamp: Utc::now(),
                });
                Err(RejectReason::WouldCrossBook.into())
            } else {
                let (order_id, sequence) = state.admit();
                let order = Order::limit(order_id, side, limit_price, quantity, sequence);
                state.rest(order)?;

                tracing::debug!(order_id = %order_id, ?side, price = %limit_price, quantity, "order rested");
                events.push(OrderEvent::OrderAccepted {
                    order_id,
                    side,
                    price: Some(limit_price),
                    quantity,
                    timestamp: Utc::now(),
                });
                events.push(OrderEvent::OrderAddedToBook {
                    order_id,
                    price: limit_price,
                    quantity,
                    timestamp: Utc::now(),
                });

                self.verify_uncrossed(state).map(|()| order_id)
            }
        };

        self.event_handler.on_events(events);
        result
    }

    /// Submit a limit order: match what crosses, rest the remainder.
    pub fn submit_limit_order(
        &self,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> BookResult<Execution> {
        self.submit_order(side, Some(price), quantity, OrderType::Limit)
    }

    /// Submit a market order: match until filled or the opposite side is
    /// exhausted. Any remainder is reported in
    /// [`Execution::unfilled_quantity`] and never rests.
    pub fn submit_market_order(&self, side: Side, quantity: Quantity) -> BookResult<Execution> {
        self.submit_order(side, None, quantity, OrderType::Market)
    }

    /// Submit an order to the matching engine. `price` is ignored for market
    /// orders.
    pub fn submit_order(
        &self,
        side: Side,
        price: Option<Price>,
        quantity: Quantity,
        order_type: OrderType,
    ) -> BookResult<Execution> {
        let limit_price = match self.validate(price, quantity, order_type) {
            Ok(limit_price) => limit_price,
            Err(reason) => return self.reject(side, reason),
        };

        let mut events = Vec::new();
        let result = {
            let mut guard = self.state.write();
            let state = &mut *guard;

            let (order_id, sequence) = state.admit();
            let mut order = Order::new(order_id, side, order_type, limit_price, quantity, sequence);

            events.push(OrderEvent::OrderAccepted {
                order_id,
                side,
                price: limit_price,
                quantity,
                timestamp: Utc::now(),
            });

            self.execute(state, &mut order, &mut events)
        };

        self.event_handler.on_events(events);
        result
    }

    /// Cancel a resting order.
    ///
    /// Fails with [`BookError::UnknownOrder`] if the id was never issued or the
    /// order is already filled or cancelled; repeating a failed cancel fails the
    /// same way.
    pub fn cancel_order(&self, order_id: OrderId) -> BookResult<()> {
        let mut events = Vec::with_capacity(1);
        let result = {
            let mut guard = self.state.write();
            let state = &mut *guard;

            match state.index.remove(&order_id) {
                None => Err(BookError::UnknownOrder {
                    order_id,
                    last_known_state: state.index.terminal_state(&order_id),
                }),
                Some(key) => match state.side(key.side).remove(&key) {
                    None => Err(BookError::UnknownOrder {
                        order_id,
                        last_known_state: None,
                    }),
                    Some(mut order) => {
                        order.cancel()?;
                        state.index.retire(&order);

                        tracing::debug!(order_id = %order_id, "order cancelled");
                        events.push(OrderEvent::OrderCancelled {
                            order_id,
                            remaining_quantity: order.remaining_quantity(),
                            timestamp: Utc::now(),
                        });

                        self.verify_uncrossed(state)
                    },
                },
            }
        };

        if let Err(BookError::UnknownOrder { .. }) = &result {
            tracing::debug!(order_id = %order_id, "cancel rejected: unknown order");
        }

        self.event_handler.on_events(events);
        result
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Best bid and best ask
    pub fn top_of_book(&self) -> TopOfBook {
        self.state.read().top_of_book()
    }

    /// Aggregated depth, best `levels` price levels per side
    pub fn depth_snapshot(&self, levels: usize) -> OrderBookSnapshot {
        let state = self.state.read();
        OrderBookSnapshot::with_depth(
            self.config.instrument.clone(),
            state.bids.depth(levels),
            state.asks.depth(levels),
        )
    }

    /// Depth snapshot at the configured number of levels
    pub fn snapshot(&self) -> OrderBookSnapshot {
        self.depth_snapshot(self.config.depth_levels)
    }

    /// Get spread
    pub fn spread(&self) -> Option<Price> {
        self.top_of_book().spread()
    }

    /// Get mid price
    pub fn mid_price(&self) -> Option<Price> {
        self.top_of_book().mid_price()
    }

    /// Current state of any order this book has issued
    pub fn order_status(&self, order_id: OrderId) -> Option<OrderState> {
        self.state.read().status(&order_id)
    }

    /// Copy of a resting order
    pub fn resting_order(&self, order_id: OrderId) -> Option<Order> {
        let state = self.state.read();
        let key = state.index.locate(&order_id)?;
        state.side(key.side).get(&key)
    }

    /// Id of the order that would trade next on `side`
    pub fn best_order_id(&self, side: Side) -> Option<OrderId> {
        self.state.read().side(side).best_order_id()
    }

    /// Number of resting orders on both sides
    pub fn order_count(&self) -> usize {
        self.state.read().index.live_count()
    }

    pub fn total_quantity(&self, side: Side) -> Quantity {
        self.state.read().side(side).total_quantity()
    }

    /// Get the instrument name
    pub fn instrument(&self) -> &str {
        &self.config.instrument
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    pub fn algorithm_name(&self) -> &str {
        self.algorithm.name()
    }

    // ========================================================================
    // Private methods
    // ========================================================================

    /// Run one matching pass for an accepted order and settle its remainder.
    /// Caller holds the write lock.
    fn execute(
        &self,
        state: &mut BookState,
        order: &mut Order,
        events: &mut Vec<OrderEvent>,
    ) -> BookResult<Execution> {
        let (opposite, index) = match order.side {
            Side::Buy => (&state.asks, &mut state.index),
            Side::Sell => (&state.bids, &mut state.index),
        };

        let mut trades = self.algorithm.match_order(order, opposite, index)?;

        for trade in &mut trades {
            trade.id = state.next_trade_id;
            state.next_trade_id += 1;

            events.push(OrderEvent::OrderMatched {
                trade: trade.clone(),
                timestamp: Utc::now(),
            });
            events.push(Self::maker_fill_event(state, trade));
        }

        let filled = order.filled_quantity();
        let remaining = order.remaining_quantity();
        let mut resting_quantity = 0;
        let mut unfilled_quantity = 0;

        if remaining == 0 {
            state.index.retire(order);
            events.push(OrderEvent::OrderFilled {
                order_id: order.id,
                total_filled: filled,
                timestamp: Utc::now(),
            });
        } else {
            if filled > 0 {
                events.push(OrderEvent::OrderPartiallyFilled {
                    order_id: order.id,
                    filled_quantity: filled,
                    remaining_quantity: remaining,
                    timestamp: Utc::now(),
                });
            }

            match order.price {
                Some(price) if order.is_limit_order() => {
                    state.rest(order.clone())?;
                    resting_quantity = remaining;
                    events.push(OrderEvent::OrderAddedToBook {
                        order_id: order.id,
                        price,
                        quantity: remaining,
                        timestamp: Utc::now(),
                    });
                },
                _ => {
                    // Insufficient liquidity: the remainder is dropped
                    order.cancel()?;
                    state.index.retire(order);
                    unfilled_quantity = remaining;
                    tracing::debug!(order_id = %order.id, unfilled = remaining, "market order exhausted liquidity");
                    events.push(OrderEvent::MarketOrderUnfilled {
                        order_id: order.id,
                        unfilled_quantity: remaining,
                        timestamp: Utc::now(),
                    });
                },
            }
        }

        tracing::debug!(
            order_id = %order.id,
            side = ?order.side,
            trades = trades.len(),
            filled,
            resting = resting_quantity,
            "order executed"
        );

        self.verify_uncrossed(state)?;

        Ok(Execution {
            order_id: order.id,
            side: order.side,
            order_type: order.order_type,
            trades,
            filled_quantity: filled,
            resting_quantity,
            unfilled_quantity,
            state: order.state(),
        })
    }

    fn maker_fill_event(state: &BookState, trade: &Trade) -> OrderEvent {
        let maker_id = trade.maker_order_id;
        let resting = state
            .index
            .locate(&maker_id)
            .and_then(|key| state.side(key.side).get(&key));

        match resting {
            Some(maker) => OrderEvent::OrderPartiallyFilled {
                order_id: maker_id,
                filled_quantity: maker.filled_quantity(),
                remaining_quantity: maker.remaining_quantity(),
                timestamp: Utc::now(),
            },
            None => OrderEvent::OrderFilled {
                order_id: maker_id,
                total_filled: state
                    .index
                    .retired(&maker_id)
                    .map_or(trade.quantity, |retired| retired.filled_quantity),
                timestamp: Utc::now(),
            },
        }
    }

    /// Returns the limit price to use (`None` for market orders)
    fn validate(
        &self,
        price: Option<Price>,
        quantity: Quantity,
        order_type: OrderType,
    ) -> Result<Option<Price>, RejectReason> {
        if quantity == 0 {
            return Err(RejectReason::ZeroQuantity);
        }

        match order_type {
            OrderType::Market => Ok(None),
            OrderType::Limit => {
                let price = price.ok_or(RejectReason::MissingLimitPrice)?;
                if price <= Decimal::ZERO {
                    return Err(RejectReason::NonPositivePrice);
                }
                if let Some(tick_size) = self.config.tick_size {
                    if !self.config.is_on_tick(price) {
                        return Err(RejectReason::OffTick { price, tick_size });
                    }
                }
                Ok(Some(price))
            },
        }
    }

    fn reject<T>(&self, side: Side, reason: RejectReason) -> BookResult<T> {
        tracing::debug!(?side, %reason, "order rejected");
        self.event_handler.on_event(OrderEvent::OrderRejected {
            side,
            reason,
            timestamp: Utc::now(),
        });
        Err(reason.into())
    }

    fn verify_uncrossed(&self, state: &BookState) -> BookResult<()> {
        if !self.config.check_invariants {
            return Ok(());
        }

        let top = state.top_of_book();
        match (top.best_bid, top.best_ask) {
            (Some(best_bid), Some(best_ask)) if best_bid >= best_ask => {
                tracing::error!(%best_bid, %best_ask, "book left crossed");
                debug_assert!(best_bid < best_ask, "book left crossed");
                Err(BookError::CrossedBook { best_bid, best_ask })
            },
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MatchingEngineBuilder, PriceTimePriority};
    use crate::interfaces::{NoOpEventHandler, RecordingEventHandler};
    use rust_decimal_macros::dec;

    fn engine() -> MatchingEngine {
        MatchingEngine::new(
            BookConfig::default(),
            Box::new(PriceTimePriority::new()),
            Arc::new(NoOpEventHandler),
        )
    }

    fn fills(execution: &Execution) -> Vec<(Price, Quantity)> {
        execution
            .trades
            .iter()
            .map(|trade| (trade.price, trade.quantity))
            .collect()
    }

    #[test]
    fn test_market_buy_walks_the_ask_side() {
        let engine = engine();
        engine
            .add_order(Side::Sell, Some(dec!(101)), 8, OrderType::Limit)
            .unwrap();
        engine
            .add_order(Side::Sell, Some(dec!(102)), 10, OrderType::Limit)
            .unwrap();

        let execution = engine.submit_market_order(Side::Buy, 12).unwrap();

        assert_eq!(fills(&execution), vec![(dec!(101), 8), (dec!(102), 4)]);
        assert_eq!(execution.unfilled_quantity, 0);
        assert_eq!(execution.state, OrderState::Filled);
        assert_eq!(engine.depth_snapshot(5).asks, vec![(dec!(102), 6)]);
        assert_eq!(engine.top_of_book(), TopOfBook::new(None, Some(dec!(102))));
    }

    #[test]
    fn test_market_sell_hits_best_bid() {
        let engine = engine();
        engine
            .add_order(Side::Buy, Some(dec!(100)), 10, OrderType::Limit)
            .unwrap();
        engine
            .add_order(Side::Buy, Some(dec!(99)), 5, OrderType::Limit)
            .unwrap();

        let execution = engine.submit_market_order(Side::Sell, 3).unwrap();

        assert_eq!(fills(&execution), vec![(dec!(100), 3)]);
        assert_eq!(
            engine.depth_snapshot(5).bids,
            vec![(dec!(100), 7), (dec!(99), 5)]
        );
    }

    #[test]
    fn test_market_order_remainder_is_discarded() {
        let engine = engine();
        let ask = engine
            .add_order(Side::Sell, Some(dec!(101)), 4, OrderType::Limit)
            .unwrap();

        let execution = engine.submit_market_order(Side::Buy, 10).unwrap();

        assert_eq!(execution.filled_quantity, 4);
        assert_eq!(execution.unfilled_quantity, 6);
        assert!(!execution.is_resting());
        assert_eq!(execution.state, OrderState::Cancelled);
        assert_eq!(engine.order_status(ask), Some(OrderState::Filled));
        assert_eq!(engine.top_of_book(), TopOfBook::default());
        assert_eq!(engine.order_count(), 0);
    }

    #[test]
    fn test_market_order_into_empty_book() {
        let engine = engine();
        let execution = engine.submit_market_order(Side::Sell, 5).unwrap();

        assert!(execution.trades.is_empty());
        assert_eq!(execution.unfilled_quantity, 5);
        assert_eq!(execution.average_price(), None);
    }

    #[test]
    fn test_limit_remainder_rests() {
        let engine = engine();
        engine
            .add_order(Side::Sell, Some(dec!(100)), 5, OrderType::Limit)
            .unwrap();

        let execution = engine.submit_limit_order(Side::Buy, dec!(101), 8).unwrap();

        assert_eq!(fills(&execution), vec![(dec!(100), 5)]);
        assert_eq!(execution.resting_quantity, 3);
        assert_eq!(execution.state, OrderState::PartiallyFilled);
        assert_eq!(engine.top_of_book(), TopOfBook::new(Some(dec!(101)), None));
        assert_eq!(
            engine.order_status(execution.order_id),
            Some(OrderState::PartiallyFilled)
        );
    }

    #[test]
    fn test_validation_errors() {
        let engine = engine();

        assert_eq!(
            engine.submit_limit_order(Side::Buy, dec!(0), 5),
            Err(BookError::InvalidOrder {
                reason: RejectReason::NonPositivePrice
            })
        );
        assert_eq!(
            engine.submit_limit_order(Side::Buy, dec!(-1), 5),
            Err(RejectReason::NonPositivePrice.into())
        );
        assert_eq!(
            engine.submit_market_order(Side::Buy, 0),
            Err(RejectReason::ZeroQuantity.into())
        );
        assert_eq!(
            engine.add_order(Side::Sell, None, 5, OrderType::Limit),
            Err(RejectReason::MissingLimitPrice.into())
        );
        assert_eq!(
            engine.add_order(Side::Sell, None, 5, OrderType::Market),
            Err(RejectReason::MarketOrderCannotRest.into())
        );
        assert_eq!(engine.order_count(), 0);
    }

    #[test]
    fn test_tick_size_enforced() {
        let engine = MatchingEngine::new(
            BookConfig::cent_ticks("X"),
            Box::new(PriceTimePriority::new()),
            Arc::new(NoOpEventHandler),
        );

        assert!(matches!(
            engine.submit_limit_order(Side::Buy, dec!(100.001), 1),
            Err(BookError::InvalidOrder {
                reason: RejectReason::OffTick { .. }
            })
        ));
        assert!(engine.submit_limit_order(Side::Buy, dec!(100.01), 1).is_ok());
    }

    #[test]
    fn test_add_order_never_crosses() {
        let engine = engine();
        engine
            .add_order(Side::Sell, Some(dec!(101)), 5, OrderType::Limit)
            .unwrap();

        assert_eq!(
            engine.add_order(Side::Buy, Some(dec!(101)), 5, OrderType::Limit),
            Err(RejectReason::WouldCrossBook.into())
        );
        assert_eq!(engine.total_quantity(Side::Sell), 5);
        assert_eq!(engine.top_of_book().best_bid, None);
    }

    #[test]
    fn test_cancel_order() {
        let engine = engine();
        let order_id = engine
            .add_order(Side::Buy, Some(dec!(100)), 5, OrderType::Limit)
            .unwrap();

        assert_eq!(engine.cancel_order(order_id), Ok(()));
        assert_eq!(engine.order_status(order_id), Some(OrderState::Cancelled));
        assert_eq!(engine.top_of_book(), TopOfBook::default());
    }

    #[test]
    fn test_cancel_unknown_or_terminal_fails_consistently() {
        let engine = engine();

        assert_eq!(
            engine.cancel_order(OrderId::new(42)),
            Err(BookError::UnknownOrder {
                order_id: OrderId::new(42),
                last_known_state: None,
            })
        );

        let order_id = engine
            .add_order(Side::Buy, Some(dec!(100)), 5, OrderType::Limit)
            .unwrap();
        engine.cancel_order(order_id).unwrap();

        let expected = Err(BookError::UnknownOrder {
            order_id,
            last_known_state: Some(OrderState::Cancelled),
        });
        assert_eq!(engine.cancel_order(order_id), expected);
        assert_eq!(engine.cancel_order(order_id), expected);
    }

    #[test]
    fn test_cancel_filled_order_fails() {
        let engine = engine();
        let ask = engine
            .add_order(Side::Sell, Some(dec!(100)), 5, OrderType::Limit)
            .unwrap();
        engine.submit_market_order(Side::Buy, 5).unwrap();

        assert_eq!(
            engine.cancel_order(ask),
            Err(BookError::UnknownOrder {
                order_id: ask,
                last_known_state: Some(OrderState::Filled),
            })
        );
    }

    #[test]
    fn test_ids_and_trade_ids_increase() {
        let engine = engine();
        let first = engine
            .add_order(Side::Sell, Some(dec!(100)), 1, OrderType::Limit)
            .unwrap();
        let second = engine
            .add_order(Side::Sell, Some(dec!(100)), 1, OrderType::Limit)
            .unwrap();
        assert!(second > first);

        let execution = engine.submit_market_order(Side::Buy, 2).unwrap();
        assert_eq!(execution.trades[0].id + 1, execution.trades[1].id);
        assert_eq!(execution.trades[0].maker_order_id, first);
        assert_eq!(execution.trades[1].maker_order_id, second);
        assert_eq!(execution.average_price(), Some(dec!(100)));
    }

    #[test]
    fn test_events_follow_execution_order() {
        let recorder = Arc::new(RecordingEventHandler::new());
        let engine = MatchingEngine::new(
            BookConfig::default(),
            Box::new(PriceTimePriority::new()),
            recorder.clone(),
        );

        let maker = engine
            .add_order(Side::Sell, Some(dec!(100)), 5, OrderType::Limit)
            .unwrap();
        recorder.take();

        let execution = engine.submit_limit_order(Side::Buy, dec!(100), 2).unwrap();
        let events = recorder.events();

        assert!(matches!(events[0], OrderEvent::OrderAccepted { order_id, .. } if order_id == execution.order_id));
        assert!(matches!(&events[1], OrderEvent::OrderMatched { trade, .. } if trade.maker_order_id == maker));
        assert!(matches!(
            events[2],
            OrderEvent::OrderPartiallyFilled { order_id, filled_quantity: 2, remaining_quantity: 3, .. } if order_id == maker
        ));
        assert!(matches!(events[3], OrderEvent::OrderFilled { total_filled: 2, .. }));
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_rejections_are_reported_to_handler() {
        let recorder = Arc::new(RecordingEventHandler::new());
        let engine = MatchingEngine::new(
            BookConfig::default(),
            Box::new(PriceTimePriority::new()),
            recorder.clone(),
        );

        let _ = engine.submit_limit_order(Side::Buy, dec!(0), 1);
        assert!(matches!(
            recorder.events()[..],
            [OrderEvent::OrderRejected {
                reason: RejectReason::NonPositivePrice,
                ..
            }]
        ));
    }

    #[test]
    fn test_order_book_snapshot() {
        let engine = engine();

        for i in 0..5 {
            engine
                .add_order(Side::Buy, Some(Decimal::from(100 - i)), 1, OrderType::Limit)
                .unwrap();
            engine
                .add_order(Side::Sell, Some(Decimal::from(101 + i)), 1, OrderType::Limit)
                .unwrap();
        }

        let snapshot = engine.depth_snapshot(3);
        assert_eq!(snapshot.bids.len(), 3);
        assert_eq!(snapshot.asks.len(), 3);
        assert_eq!(snapshot.spread, Some(dec!(1)));
        assert_eq!(snapshot.mid_price, Some(dec!(100.5)));
        assert_eq!(engine.snapshot().bids.len(), 5);
        assert_eq!(engine.order_count(), 10);
    }

    #[test]
    fn test_huge_quantities_aggregate_without_overflow() {
        let engine = engine();
        engine
            .add_order(Side::Sell, Some(dec!(100)), u64::MAX, OrderType::Limit)
            .unwrap();
        engine
            .add_order(Side::Sell, Some(dec!(100)), 1, OrderType::Limit)
            .unwrap();
        engine
            .add_order(Side::Buy, Some(dec!(99)), u64::MAX, OrderType::Limit)
            .unwrap();
        engine
            .add_order(Side::Buy, Some(dec!(99)), 1, OrderType::Limit)
            .unwrap();

        let snapshot = engine.depth_snapshot(5);
        assert_eq!(snapshot.asks, vec![(dec!(100), u64::MAX)]);
        assert_eq!(snapshot.bids, vec![(dec!(99), u64::MAX)]);
        assert_eq!(engine.total_quantity(Side::Buy), u64::MAX);
        assert_eq!(engine.total_quantity(Side::Sell), u64::MAX);
    }

    #[test]
    fn test_extreme_prices_snapshot() {
        let engine = engine();
        engine
            .add_order(Side::Sell, Some(Decimal::MAX), 1, OrderType::Limit)
            .unwrap();
        engine
            .add_order(Side::Buy, Some(Decimal::MAX - Decimal::ONE), 1, OrderType::Limit)
            .unwrap();

        let snapshot = engine.depth_snapshot(5);
        assert_eq!(snapshot.spread, Some(Decimal::ONE));
        assert_eq!(engine.spread(), Some(Decimal::ONE));
        if let Some(mid) = engine.mid_price() {
            assert!(mid >= Decimal::MAX - Decimal::ONE);
        }
    }

    #[test]
    fn test_average_price_none_on_overflowing_notional() {
        let engine = engine();
        engine
            .add_order(Side::Sell, Some(Decimal::MAX), u64::MAX, OrderType::Limit)
            .unwrap();

        let execution = engine.submit_market_order(Side::Buy, 2).unwrap();
        assert_eq!(execution.filled_quantity, 2);
        assert_eq!(execution.average_price(), None);
    }

    /// Rests every order without looking at the opposite side
    struct NeverMatch;

    impl MatchingAlgorithm for NeverMatch {
        fn match_order(
            &self,
            _incoming_order: &mut Order,
            _opposite_side: &OrderBookSide,
            _index: &mut OrderIndex,
        ) -> BookResult<Vec<Trade>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "NeverMatch"
        }
    }

    fn non_matching_engine(check_invariants: bool) -> MatchingEngine {
        MatchingEngineBuilder::new("SIM")
            .with_algorithm(Box::new(NeverMatch))
            .with_invariant_checks(check_invariants)
            .build()
            .unwrap()
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "book left crossed")]
    fn test_crossed_book_trips_debug_assertion() {
        let engine = non_matching_engine(true);
        engine
            .add_order(Side::Sell, Some(dec!(100)), 5, OrderType::Limit)
            .unwrap();

        let _ = engine.submit_limit_order(Side::Buy, dec!(101), 5);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_crossed_book_reported_as_error() {
        let engine = non_matching_engine(true);
        engine
            .add_order(Side::Sell, Some(dec!(100)), 5, OrderType::Limit)
            .unwrap();

        assert_eq!(
            engine.submit_limit_order(Side::Buy, dec!(101), 5),
            Err(BookError::CrossedBook {
                best_bid: dec!(101),
                best_ask: dec!(100),
            })
        );
    }

    #[test]
    fn test_crossed_book_check_can_be_disabled() {
        let engine = non_matching_engine(false);
        engine
            .add_order(Side::Sell, Some(dec!(100)), 5, OrderType::Limit)
            .unwrap();

        let execution = engine.submit_limit_order(Side::Buy, dec!(101), 5).unwrap();
        assert!(execution.trades.is_empty());
        assert_eq!(execution.resting_quantity, 5);
        assert!(engine.top_of_book().is_crossed());
    }
}
