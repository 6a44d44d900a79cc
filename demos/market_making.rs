// ============================================================================
// Market-Making Example
// ============================================================================
//
// Run with `cargo run --example market_making --features logging` to see the
// session log.

use mm_orderbook::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

fn main() -> BookResult<()> {
    #[cfg(feature = "logging")]
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Order Book Example ===\n");

    let engine = MatchingEngineBuilder::from_config(BookConfig::cent_ticks("SIM"))
        .with_event_handler(Arc::new(LoggingEventHandler))
        .build()?;

    println!("Adding resting orders...");
    for i in 0..5 {
        engine.add_order(Side::Sell, Some(Decimal::new(10_050 + i * 25, 2)), 10, OrderType::Limit)?;
        engine.add_order(Side::Buy, Some(Decimal::new(9_950 - i * 25, 2)), 10, OrderType::Limit)?;
    }
    print_snapshot(&engine.snapshot());

    println!("\nSubmitting aggressive buy for 25 @ 101.00...");
    let execution = engine.submit_limit_order(Side::Buy, Decimal::new(10_100, 2), 25)?;
    for trade in &execution.trades {
        println!("  trade #{}: {} @ {}", trade.id, trade.quantity, trade.price);
    }
    println!(
        "  filled {}, resting {}, average price {:?}",
        execution.filled_quantity,
        execution.resting_quantity,
        execution.average_price()
    );
    print_snapshot(&engine.snapshot());

    println!("\n=== Market-Making Sessions ===\n");
    let config = SessionConfig::default();

    let spread = SpreadQuoter::new(QuoterConfig::default())?;
    report("spread quoter", run_session(Box::new(spread), config.clone())?);

    let learner = QLearningQuoter::new(
        SpreadQuoter::new(QuoterConfig::default())?,
        QLearningConfig::default(),
        config.seed,
    )?;
    report("q-learning quoter", run_session(Box::new(learner), config)?);

    Ok(())
}

fn run_session(
    strategy: Box<dyn QuoteStrategy>,
    config: SessionConfig,
) -> BookResult<PerformanceSummary> {
    let engine = Arc::new(create_from_config(
        BookConfig::simulation_default(),
        Arc::new(NoOpEventHandler),
    )?);
    MarketMakingSession::new(engine, strategy, config)?.run()
}

fn report(name: &str, summary: PerformanceSummary) {
    println!("{name}:");
    println!("  steps:          {}", summary.steps);
    println!("  final equity:   {:.2}", summary.final_equity);
    println!("  pnl:            {:.2}", summary.pnl);
    println!("  max drawdown:   {:.2}", summary.max_drawdown);
    println!("  inventory:      {}", summary.final_inventory);
}

fn print_snapshot(snapshot: &OrderBookSnapshot) {
    println!("\nAsks:");
    for (price, quantity) in snapshot.asks.iter().rev() {
        println!("  {} @ {}", quantity, price);
    }
    println!("Bids:");
    for (price, quantity) in &snapshot.bids {
        println!("  {} @ {}", quantity, price);
    }
    println!("Spread: {:?}, mid: {:?}", snapshot.spread, snapshot.mid_price);
}
