// ============================================================================
// Simulation Module
// Synthetic order flow and market-making sessions on top of the book
// ============================================================================

mod order_flow;
mod performance;
mod session;

pub use order_flow::{OrderFlowConfig, OrderFlowSimulator};
pub use performance::{PerformanceSample, PerformanceSummary, PerformanceTracker};
pub use session::{MarketMakingSession, SessionConfig};
