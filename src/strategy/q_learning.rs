// ============================================================================
// Q-Learning Quoter
// Tabular Q-learning over spread adjustments on top of a spread quoter
// ============================================================================

use super::{FillReport, MarketView, Position, QuoteStrategy, Quotes, SpreadQuoter};
use crate::domain::{BookError, BookResult, Price};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Learning parameters
#[derive(Debug, Clone, PartialEq)]
pub struct QLearningConfig {
    pub learning_rate: f64,
    pub discount_factor: f64,
    /// Initial probability of a random action
    pub exploration_rate: f64,
    /// Multiplier applied to the exploration rate after every update
    pub exploration_decay: f64,
    pub min_exploration_rate: f64,
    /// Spread change per action
    pub spread_step: Decimal,
    pub min_spread: Decimal,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.95,
            exploration_rate: 1.0,
            exploration_decay: 0.995,
            min_exploration_rate: 0.01,
            spread_step: Decimal::new(1, 3),
            min_spread: Decimal::new(1, 3),
        }
    }
}

impl QLearningConfig {
    pub fn validate(&self) -> BookResult<()> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.learning_rate)
            || !unit.contains(&self.discount_factor)
            || !unit.contains(&self.exploration_rate)
            || !unit.contains(&self.exploration_decay)
            || !unit.contains(&self.min_exploration_rate)
        {
            return Err(BookError::InvalidConfig(
                "learning parameters must lie in [0, 1]".to_string(),
            ));
        }
        if self.spread_step <= Decimal::ZERO || self.min_spread <= Decimal::ZERO {
            return Err(BookError::InvalidConfig(
                "spread step and minimum spread must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Spread adjustment chosen each step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpreadAction {
    Tighten,
    Widen,
}

impl SpreadAction {
    pub const ALL: [SpreadAction; 2] = [SpreadAction::Tighten, SpreadAction::Widen];

    fn index(self) -> usize {
        match self {
            SpreadAction::Tighten => 0,
            SpreadAction::Widen => 1,
        }
    }
}

/// Discretised market state: reference price and volatility to the cent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MarketState {
    price: Decimal,
    volatility: Decimal,
}

impl MarketState {
    fn observe(market: &MarketView) -> Self {
        Self {
            price: market.reference_price.round_dp(2).normalize(),
            volatility: market.volatility.round_dp(2).normalize(),
        }
    }
}

/// Spread quoter whose spread is steered by an epsilon-greedy Q-learner.
///
/// Reward is equity over starting cash, marked at the reference price.
pub struct QLearningQuoter {
    quoter: SpreadQuoter,
    config: QLearningConfig,
    q_table: HashMap<MarketState, [f64; 2]>,
    exploration_rate: f64,
    pending: Option<(MarketState, SpreadAction)>,
    rng: ChaCha8Rng,
}

impl QLearningQuoter {
    pub fn new(quoter: SpreadQuoter, config: QLearningConfig, seed: u64) -> BookResult<Self> {
        config.validate()?;
        Ok(Self {
            quoter,
            exploration_rate: config.exploration_rate,
            config,
            q_table: HashMap::new(),
            pending: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    pub fn spread(&self) -> Decimal {
        self.quoter.spread()
    }

    pub fn exploration_rate(&self) -> f64 {
        self.exploration_rate
    }

    /// Number of distinct market states visited
    pub fn states_learned(&self) -> usize {
        self.q_table.len()
    }

    fn choose_action(&mut self, state: MarketState) -> SpreadAction {
        if self.rng.gen::<f64>() < self.exploration_rate {
            return SpreadAction::ALL[self.rng.gen_range(0..SpreadAction::ALL.len())];
        }

        let values = self.q_table.get(&state).copied().unwrap_or_default();
        if values[SpreadAction::Widen.index()] > values[SpreadAction::Tighten.index()] {
            SpreadAction::Widen
        } else {
            SpreadAction::Tighten
        }
    }

    fn apply(&mut self, action: SpreadAction) {
        let step = self.config.spread_step;
        let spread = match action {
            SpreadAction::Tighten => self.quoter.spread() - step,
            SpreadAction::Widen => self.quoter.spread() + step,
        };
        self.quoter.set_spread(spread.max(self.config.min_spread));
    }

    fn reward(&self, mark: Price) -> f64 {
        let starting_cash = self.quoter.config().starting_cash;
        (self.quoter.position().equity(Some(mark)) - starting_cash)
            .to_f64()
            .unwrap_or(0.0)
    }

    fn update(&mut self, state: MarketState, action: SpreadAction, reward: f64, next: MarketState) {
        let best_next = self
            .q_table
            .get(&next)
            .map_or(0.0, |values| values.iter().copied().fold(f64::MIN, f64::max));

        let values = self.q_table.entry(state).or_default();
        let current = values[action.index()];
        values[action.index()] = current
            + self.config.learning_rate
                * (reward + self.config.discount_factor * best_next - current);

        self.exploration_rate = (self.exploration_rate * self.config.exploration_decay)
            .max(self.config.min_exploration_rate);
    }
}

impl QuoteStrategy for QLearningQuoter {
    fn decide_quotes(&mut self, market: &MarketView) -> Quotes {
        let state = MarketState::observe(market);
        let action = self.choose_action(state);
        self.apply(action);
        self.pending = Some((state, action));
        self.quoter.decide_quotes(market)
    }

    fn on_fill(&mut self, fill: &FillReport) {
        self.quoter.on_fill(fill);
    }

    fn on_step_end(&mut self, market: &MarketView) {
        if let Some((state, action)) = self.pending.take() {
            let reward = self.reward(market.reference_price);
            let next = MarketState::observe(market);
            self.update(state, action, reward, next);

            tracing::trace!(?action, reward, spread = %self.quoter.spread(), "q-table updated");
        }
    }

    fn position(&self) -> Position {
        self.quoter.position()
    }

    fn name(&self) -> &str {
        "QLearningQuoter"
    }
}
