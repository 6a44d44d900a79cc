// ============================================================================
// Performance Tracking
// Per-step equity samples and run summary for a quoting strategy
// ============================================================================

use crate::domain::Price;
use crate::strategy::Position;
use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One observation of the strategy's account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PerformanceSample {
    pub step: usize,
    /// Cash plus inventory marked at the best bid
    pub total_assets: Decimal,
    pub inventory: i64,
    pub cash: Decimal,
}

/// Aggregate figures for a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PerformanceSummary {
    pub steps: usize,
    pub starting_equity: Decimal,
    pub final_equity: Decimal,
    pub pnl: Decimal,
    /// Largest peak-to-trough fall in total assets
    pub max_drawdown: Decimal,
    pub final_inventory: i64,
}

#[derive(Debug, Clone, Default)]
pub struct PerformanceTracker {
    starting_equity: Decimal,
    samples: Vec<PerformanceSample>,
}

impl PerformanceTracker {
    pub fn new(starting_equity: Decimal) -> Self {
        Self {
            starting_equity,
            samples: Vec::new(),
        }
    }

    /// Record the account after `step`. Inventory is marked at `best_bid`,
    /// the price it could be sold at.
    pub fn track(&mut self, step: usize, position: Position, best_bid: Option<Price>) {
        self.samples.push(PerformanceSample {
            step,
            total_assets: position.equity(best_bid),
            inventory: position.inventory,
            cash: position.cash,
        });
    }

    pub fn samples(&self) -> &[PerformanceSample] {
        &self.samples
    }

    pub fn max_drawdown(&self) -> Decimal {
        let mut peak = self.starting_equity;
        let mut worst = Decimal::ZERO;
        for sample in &self.samples {
            peak = peak.max(sample.total_assets);
            worst = worst.max(peak - sample.total_assets);
        }
        worst
    }

    pub fn summary(&self) -> PerformanceSummary {
        let last = self.samples.last();
        let final_equity = last.map_or(self.starting_equity, |sample| sample.total_assets);

        PerformanceSummary {
            steps: self.samples.len(),
            starting_equity: self.starting_equity,
            final_equity,
            pnl: final_equity - self.starting_equity,
            max_drawdown: self.max_drawdown(),
            final_inventory: last.map_or(0, |sample| sample.inventory),
        }
    }
}
