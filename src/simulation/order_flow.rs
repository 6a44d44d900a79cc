// ============================================================================
// Order Flow Simulator
// Seeded random liquidity providers and takers around a fixed price band
// ============================================================================

use crate::domain::{BookError, BookResult, OrderId, PriorityKey, Quantity, Side};
use crate::engine::{Execution, MatchingEngine};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;

/// Shape of the random order flow
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFlowConfig {
    /// Chance of a new limit order each step
    pub add_probability: f64,
    /// Chance of cancelling a resting simulated order each step
    pub cancel_probability: f64,
    /// Limit prices are drawn uniformly in cents from this band
    pub min_price_cents: i64,
    pub max_price_cents: i64,
    pub max_limit_quantity: Quantity,
    /// Chance, per side, of a market order each step
    pub taker_probability: f64,
    pub min_taker_quantity: Quantity,
    pub max_taker_quantity: Quantity,
}

impl Default for OrderFlowConfig {
    fn default() -> Self {
        Self {
            add_probability: 0.5,
            cancel_probability: 0.2,
            min_price_cents: 9_000,
            max_price_cents: 11_000,
            max_limit_quantity: 100,
            taker_probability: 0.5,
            min_taker_quantity: 5,
            max_taker_quantity: 20,
        }
    }
}

impl OrderFlowConfig {
    pub fn validate(&self) -> BookResult<()> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.add_probability)
            || !unit.contains(&self.cancel_probability)
            || !unit.contains(&self.taker_probability)
        {
            return Err(BookError::InvalidConfig(
                "probabilities must lie in [0, 1]".to_string(),
            ));
        }
        if self.min_price_cents <= 0 || self.min_price_cents > self.max_price_cents {
            return Err(BookError::InvalidConfig(
                "price band must be positive and non-empty".to_string(),
            ));
        }
        if self.max_limit_quantity == 0
            || self.min_taker_quantity == 0
            || self.min_taker_quantity > self.max_taker_quantity
        {
            return Err(BookError::InvalidConfig(
                "order quantities must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generates background liquidity and taker flow against an engine.
///
/// Only orders this simulator placed are ever cancelled by it.
pub struct OrderFlowSimulator {
    config: OrderFlowConfig,
    rng: ChaCha8Rng,
    own_orders: Vec<OrderId>,
}

impl OrderFlowSimulator {
    pub fn new(config: OrderFlowConfig, seed: u64) -> BookResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            own_orders: Vec::new(),
        })
    }

    pub fn config(&self) -> &OrderFlowConfig {
        &self.config
    }

    /// Maybe place a limit order, then maybe cancel the best-ranked resting
    /// simulated order on a random side.
    pub fn provide_liquidity(&mut self, engine: &MatchingEngine) -> BookResult<Vec<Execution>> {
        let mut executions = Vec::new();

        if self.rng.gen_bool(self.config.add_probability) {
            let side = self.random_side();
            let cents = self
                .rng
                .gen_range(self.config.min_price_cents..=self.config.max_price_cents);
            let quantity = self.rng.gen_range(1..=self.config.max_limit_quantity);

            let execution = engine.submit_limit_order(side, Decimal::new(cents, 2), quantity)?;
            if execution.is_resting() {
                self.own_orders.push(execution.order_id);
            }
            executions.push(execution);
        }

        if self.rng.gen_bool(self.config.cancel_probability) {
            let side = self.random_side();
            self.cancel_best(engine, side)?;
        }

        Ok(executions)
    }

    /// Market orders on each side with the configured probability
    pub fn take_liquidity(&mut self, engine: &MatchingEngine) -> BookResult<Vec<Execution>> {
        let mut executions = Vec::new();
        for side in [Side::Buy, Side::Sell] {
            if self.rng.gen_bool(self.config.taker_probability) {
                let quantity = self
                    .rng
                    .gen_range(self.config.min_taker_quantity..=self.config.max_taker_quantity);
                executions.push(engine.submit_market_order(side, quantity)?);
            }
        }
        Ok(executions)
    }

    /// Number of simulated orders still resting on `engine`
    pub fn resting_orders(&self, engine: &MatchingEngine) -> usize {
        self.own_orders
            .iter()
            .filter_map(|order_id| engine.order_status(*order_id))
            .filter(|state| state.can_be_cancelled())
            .count()
    }

    fn random_side(&mut self) -> Side {
        if self.rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    fn cancel_best(&mut self, engine: &MatchingEngine, side: Side) -> BookResult<Option<OrderId>> {
        self.own_orders.retain(|order_id| {
            engine
                .order_status(*order_id)
                .is_some_and(|state| state.can_be_cancelled())
        });

        let best = self
            .own_orders
            .iter()
            .filter_map(|order_id| engine.resting_order(*order_id))
            .filter(|order| order.side == side && order.state().can_be_cancelled())
            .filter_map(|order| PriorityKey::for_order(&order).map(|key| (key, order.id)))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, order_id)| order_id);

        let Some(order_id) = best else {
            return Ok(None);
        };

        match engine.cancel_order(order_id) {
            Ok(()) => {
                self.own_orders.retain(|id| *id != order_id);
                Ok(Some(order_id))
            },
            Err(BookError::UnknownOrder { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
