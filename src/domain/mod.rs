// ============================================================================
// Domain Models Module
// Contains all core domain entities and value objects
// ============================================================================

pub mod config;
pub mod errors;
pub mod order;
pub mod order_book;
pub mod priority;
pub mod trade;

pub use config::BookConfig;
pub use errors::{BookError, BookResult, RejectReason};
pub use order::{Order, OrderId, OrderType, Price, Quantity, Side};
pub use order_book::{OrderBookSide, OrderBookSnapshot, OrderIndex, RetiredOrder, TopOfBook};
pub use priority::PriorityKey;
pub use trade::Trade;

// Re-export state machine
pub use order::state::{OrderState, OrderStateTransition};
