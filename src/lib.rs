// ============================================================================
// Market-Making Order Book Library
// Price-time priority limit order book with a market-making simulation layer
// ============================================================================

//! # Market-Making Order Book
//!
//! A single-instrument limit order book that matches by price-time priority,
//! plus the quoting strategies and synthetic order flow used to study market
//! making against it.
//!
//! ## Features
//!
//! - **Price-time priority matching** with trades at the resting price
//! - **Never-crossed book** checked after every mutation
//! - **Pluggable matching algorithm** and event handlers
//! - **Quoting strategies**: fixed spread and Q-learning spread control
//! - **Seeded simulation** of background liquidity and takers
//!
//! ## Example
//!
//! ```rust
//! use mm_orderbook::prelude::*;
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! let engine = create_from_config(
//!     BookConfig::cent_ticks("SIM"),
//!     Arc::new(NoOpEventHandler),
//! ).unwrap();
//!
//! engine.add_order(Side::Sell, Some(Decimal::new(10100, 2)), 10, OrderType::Limit).unwrap();
//! engine.add_order(Side::Buy, Some(Decimal::new(9900, 2)), 10, OrderType::Limit).unwrap();
//!
//! let execution = engine.submit_market_order(Side::Buy, 4).unwrap();
//! assert_eq!(execution.filled_quantity, 4);
//! assert_eq!(execution.trades[0].price, Decimal::new(10100, 2));
//!
//! let top = engine.top_of_book();
//! println!("Best bid: {:?}", top.best_bid);
//! println!("Best ask: {:?}", top.best_ask);
//! println!("Spread: {:?}", top.spread());
//! ```

pub mod domain;
pub mod engine;
pub mod interfaces;
pub mod simulation;
pub mod strategy;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::order::state::{OrderState, OrderStateTransition};
    pub use crate::domain::{
        BookConfig, BookError, BookResult, Order, OrderBookSnapshot, OrderId, OrderType, Price,
        Quantity, RejectReason, Side, TopOfBook, Trade,
    };
    pub use crate::engine::{
        create_from_config, Execution, MatchingEngine, MatchingEngineBuilder, PriceTimePriority,
    };
    pub use crate::interfaces::{
        EventHandler, LoggingEventHandler, MatchingAlgorithm, NoOpEventHandler, OrderEvent,
        RecordingEventHandler,
    };
    pub use crate::simulation::{
        MarketMakingSession, OrderFlowConfig, OrderFlowSimulator, PerformanceSample,
        PerformanceSummary, PerformanceTracker, SessionConfig,
    };
    pub use crate::strategy::{
        FillReport, MarketView, Position, QLearningConfig, QLearningQuoter, Quote, QuoteStrategy,
        QuoterConfig, Quotes, SpreadAction, SpreadQuoter,
    };
}
