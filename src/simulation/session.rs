// ============================================================================
// Market-Making Session
// Drives one quoting strategy against simulated order flow
// ============================================================================

use super::order_flow::{OrderFlowConfig, OrderFlowSimulator};
use super::performance::{PerformanceSummary, PerformanceTracker};
use crate::domain::{BookError, BookResult, OrderId, Price, Side};
use crate::engine::{Execution, MatchingEngine};
use crate::strategy::{FillReport, MarketView, QuoteStrategy};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Run parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub steps: usize,
    /// Sleep before each quote update, standing in for network delay
    pub latency: Duration,
    pub seed: u64,
    /// Reference price until the book trades or becomes two-sided
    pub initial_price: Price,
    pub flow: OrderFlowConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            steps: 600,
            latency: Duration::ZERO,
            seed: 42,
            initial_price: Decimal::from(100),
            flow: OrderFlowConfig::default(),
        }
    }
}

/// One strategy quoting into one book while simulated traders add, cancel
/// and take liquidity around it.
///
/// Each step: background orders arrive, stale quotes are pulled, fresh quotes
/// are posted against the remaining book, takers trade, then the account is
/// sampled.
pub struct MarketMakingSession {
    engine: Arc<MatchingEngine>,
    strategy: Box<dyn QuoteStrategy>,
    flow: OrderFlowSimulator,
    tracker: PerformanceTracker,
    config: SessionConfig,
    live_quotes: Vec<(OrderId, Side)>,
    last_trade_price: Option<Price>,
}

impl MarketMakingSession {
    pub fn new(
        engine: Arc<MatchingEngine>,
        strategy: Box<dyn QuoteStrategy>,
        config: SessionConfig,
    ) -> BookResult<Self> {
        if config.initial_price <= Decimal::ZERO {
            return Err(BookError::InvalidConfig(
                "initial price must be positive".to_string(),
            ));
        }

        let flow = OrderFlowSimulator::new(config.flow.clone(), config.seed)?;
        let tracker = PerformanceTracker::new(strategy.position().equity(None));

        Ok(Self {
            engine,
            strategy,
            flow,
            tracker,
            config,
            live_quotes: Vec::new(),
            last_trade_price: None,
        })
    }

    /// Run every configured step and summarise the result
    pub fn run(&mut self) -> BookResult<PerformanceSummary> {
        tracing::info!(
            strategy = self.strategy.name(),
            instrument = self.engine.instrument(),
            steps = self.config.steps,
            seed = self.config.seed,
            "market-making session started"
        );

        for step in 0..self.config.steps {
            self.step(step)?;
        }

        let summary = self.tracker.summary();
        tracing::info!(
            strategy = self.strategy.name(),
            pnl = %summary.pnl,
            max_drawdown = %summary.max_drawdown,
            inventory = summary.final_inventory,
            "market-making session finished"
        );
        Ok(summary)
    }

    pub fn step(&mut self, step: usize) -> BookResult<()> {
        let background = self.flow.provide_liquidity(&self.engine)?;
        self.settle(&background);

        self.withdraw_quotes()?;
        let market = self.market_view();

        if !self.config.latency.is_zero() {
            std::thread::sleep(self.config.latency);
        }
        self.post_quotes(&market)?;

        let takers = self.flow.take_liquidity(&self.engine)?;
        self.settle(&takers);

        let after = self.market_view();
        self.strategy.on_step_end(&after);
        self.tracker
            .track(step, self.strategy.position(), after.top.best_bid);

        tracing::trace!(
            step,
            live_quotes = self.live_quotes.len(),
            background_orders = self.flow.resting_orders(&self.engine),
            "step complete"
        );
        Ok(())
    }

    pub fn engine(&self) -> &Arc<MatchingEngine> {
        &self.engine
    }

    pub fn strategy(&self) -> &dyn QuoteStrategy {
        self.strategy.as_ref()
    }

    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    /// Quotes the strategy currently has resting
    pub fn live_quotes(&self) -> &[(OrderId, Side)] {
        &self.live_quotes
    }

    /// Current top of book, reference price and bid dispersion
    pub fn market_view(&self) -> MarketView {
        let top = self.engine.top_of_book();
        let reference_price = top
            .mid_price()
            .or(self.last_trade_price)
            .unwrap_or(self.config.initial_price);

        MarketView {
            top,
            reference_price,
            volatility: self.bid_dispersion(),
        }
    }

    fn bid_dispersion(&self) -> Decimal {
        let bids: Vec<f64> = self
            .engine
            .depth_snapshot(usize::MAX)
            .bids
            .iter()
            .filter_map(|(price, _)| price.to_f64())
            .collect();
        if bids.is_empty() {
            return Decimal::ZERO;
        }

        let count = bids.len() as f64;
        let mean = bids.iter().sum::<f64>() / count;
        let variance = bids.iter().map(|price| (price - mean).powi(2)).sum::<f64>() / count;
        Decimal::from_f64(variance.sqrt()).unwrap_or_default()
    }

    fn withdraw_quotes(&mut self) -> BookResult<()> {
        for (order_id, _) in self.live_quotes.drain(..) {
            match self.engine.cancel_order(order_id) {
                Ok(()) | Err(BookError::UnknownOrder { .. }) => {},
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn post_quotes(&mut self, market: &MarketView) -> BookResult<()> {
        let quotes = self.strategy.decide_quotes(market);

        for (side, quote) in [(Side::Buy, quotes.bid), (Side::Sell, quotes.ask)] {
            let Some(quote) = quote else { continue };

            let execution = match self
                .engine
                .submit_limit_order(side, quote.price, quote.quantity)
            {
                Ok(execution) => execution,
                Err(BookError::InvalidOrder { reason }) => {
                    tracing::warn!(?side, price = %quote.price, %reason, "quote rejected");
                    continue;
                },
                Err(err) => return Err(err),
            };

            // A quote that crossed traded as the aggressor
            for trade in &execution.trades {
                self.last_trade_price = Some(trade.price);
                self.strategy.on_fill(&FillReport {
                    order_id: execution.order_id,
                    side,
                    price: trade.price,
                    quantity: trade.quantity,
                });
            }

            if execution.is_resting() {
                self.live_quotes.push((execution.order_id, side));
            }
        }
        Ok(())
    }

    /// Route fills against resting quotes to the strategy
    fn settle(&mut self, executions: &[Execution]) {
        for trade in executions.iter().flat_map(|execution| &execution.trades) {
            self.last_trade_price = Some(trade.price);

            let quote = self
                .live_quotes
                .iter()
                .find(|(order_id, _)| *order_id == trade.maker_order_id);
            if let Some(&(order_id, side)) = quote {
                self.strategy.on_fill(&FillReport {
                    order_id,
                    side,
                    price: trade.price,
                    quantity: trade.quantity,
                });
            }
        }
    }
}
