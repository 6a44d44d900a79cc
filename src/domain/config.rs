// ============================================================================
// Order Book Configuration
// ============================================================================

use super::errors::{BookError, BookResult};
use super::Price;
use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default number of price levels per side shown by [`crate::engine::MatchingEngine::snapshot`]
pub const DEFAULT_DEPTH_LEVELS: usize = 5;

/// Configuration for a single-instrument book
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BookConfig {
    /// Instrument label, carried on snapshots only
    pub instrument: String,

    /// Price levels per side in the default snapshot
    pub depth_levels: usize,

    /// Optional: Price tick size (minimum price increment)
    /// None means no tick size enforcement
    pub tick_size: Option<Price>,

    /// Verify the book is not crossed after every mutating operation
    pub check_invariants: bool,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            instrument: "SIM".to_string(),
            depth_levels: DEFAULT_DEPTH_LEVELS,
            tick_size: None,
            check_invariants: true,
        }
    }
}

impl BookConfig {
    pub fn new(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            ..Self::default()
        }
    }

    /// Builder method: Set default snapshot depth
    pub fn with_depth_levels(mut self, levels: usize) -> Self {
        self.depth_levels = levels;
        self
    }

    /// Builder method: Set price tick size
    pub fn with_tick_size(mut self, tick: Price) -> Self {
        self.tick_size = Some(tick);
        self
    }

    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.check_invariants = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> BookResult<()> {
        if self.instrument.is_empty() {
            return Err(BookError::InvalidConfig(
                "instrument cannot be empty".to_string(),
            ));
        }

        if self.depth_levels == 0 {
            return Err(BookError::InvalidConfig(
                "depth levels must be positive".to_string(),
            ));
        }

        if let Some(tick) = self.tick_size {
            if tick <= Decimal::ZERO {
                return Err(BookError::InvalidConfig(
                    "tick size must be positive".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Whether `price` sits on the configured tick grid
    pub fn is_on_tick(&self, price: Price) -> bool {
        match self.tick_size {
            Some(tick) => (price % tick).is_zero(),
            None => true,
        }
    }
}

// ============================================================================
// Preset Configurations
// ============================================================================

impl BookConfig {
    /// Book used by the market-making simulation: five display levels,
    /// cent ticks.
    pub fn simulation_default() -> Self {
        Self::cent_ticks("SIM")
    }

    /// Prices quoted to the cent
    pub fn cent_ticks(instrument: impl Into<String>) -> Self {
        Self::new(instrument).with_tick_size(Decimal::new(1, 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_config_creation() {
        let config = BookConfig::new("XYZ");

        assert_eq!(config.instrument, "XYZ");
        assert_eq!(config.depth_levels, DEFAULT_DEPTH_LEVELS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = BookConfig::simulation_default()
            .with_depth_levels(10)
            .with_invariant_checks(false);

        assert_eq!(config.depth_levels, 10);
        assert_eq!(config.tick_size, Some(dec!(0.01)));
        assert!(!config.check_invariants);
    }

    #[test]
    fn test_validation() {
        assert!(BookConfig::new("").validate().is_err());
        assert!(BookConfig::new("X").with_depth_levels(0).validate().is_err());
        assert!(BookConfig::new("X")
            .with_tick_size(dec!(-0.01))
            .validate()
            .is_err());
    }

    #[test]
    fn test_tick_grid() {
        let config = BookConfig::cent_ticks("X");
        assert!(config.is_on_tick(dec!(100.25)));
        assert!(!config.is_on_tick(dec!(100.255)));
        assert!(BookConfig::new("X").is_on_tick(dec!(100.255)));
    }
}
