// ============================================================================
// Order Book Factory
// Creates matching engines with proper configuration
// ============================================================================

use crate::domain::{BookConfig, BookResult, Price};
use crate::engine::{MatchingEngine, PriceTimePriority};
use crate::interfaces::{EventHandler, MatchingAlgorithm, NoOpEventHandler};
use std::sync::Arc;

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates a price/time matching engine from configuration
///
/// # Example
/// ```
/// use mm_orderbook::prelude::*;
/// use std::sync::Arc;
///
/// let config = BookConfig::cent_ticks("SIM");
/// let engine = create_from_config(config, Arc::new(NoOpEventHandler)).unwrap();
/// assert_eq!(engine.instrument(), "SIM");
/// ```
pub fn create_from_config(
    config: BookConfig,
    event_handler: Arc<dyn EventHandler>,
) -> BookResult<MatchingEngine> {
    config.validate()?;

    tracing::debug!(instrument = %config.instrument, "creating order book");
    Ok(MatchingEngine::new(
        config,
        Box::new(PriceTimePriority::new()),
        event_handler,
    ))
}

// ============================================================================
// Builder Pattern for Advanced Configuration
// ============================================================================

/// Builder for creating matching engines with fluent API
///
/// # Example
/// ```
/// use mm_orderbook::prelude::*;
/// use rust_decimal::Decimal;
///
/// let engine = MatchingEngineBuilder::new("SIM")
///     .with_tick_size(Decimal::new(1, 2))
///     .with_depth_levels(10)
///     .build()
///     .unwrap();
/// assert_eq!(engine.config().depth_levels, 10);
/// ```
pub struct MatchingEngineBuilder {
    config: BookConfig,
    algorithm: Option<Box<dyn MatchingAlgorithm>>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl MatchingEngineBuilder {
    /// Create a new builder for the specified instrument
    pub fn new(instrument: impl Into<String>) -> Self {
        Self::from_config(BookConfig::new(instrument))
    }

    pub fn from_config(config: BookConfig) -> Self {
        Self {
            config,
            algorithm: None,
            event_handler: None,
        }
    }

    /// Set price tick size
    pub fn with_tick_size(mut self, tick_size: Price) -> Self {
        self.config.tick_size = Some(tick_size);
        self
    }

    /// Set default snapshot depth
    pub fn with_depth_levels(mut self, levels: usize) -> Self {
        self.config.depth_levels = levels;
        self
    }

    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.config.check_invariants = enabled;
        self
    }

    /// Replace the default price/time algorithm
    pub fn with_algorithm(mut self, algorithm: Box<dyn MatchingAlgorithm>) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn with_event_handler(mut self, event_handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(event_handler);
        self
    }

    /// Build the matching engine
    pub fn build(self) -> BookResult<MatchingEngine> {
        self.config.validate()?;

        let algorithm = self
            .algorithm
            .unwrap_or_else(|| Box::new(PriceTimePriority::new()));
        let event_handler = self
            .event_handler
            .unwrap_or_else(|| Arc::new(NoOpEventHandler));

        Ok(MatchingEngine::new(self.config, algorithm, event_handler))
    }

    /// Get the configuration without building (for inspection)
    pub fn config(&self) -> &BookConfig {
        &self.config
    }
}
