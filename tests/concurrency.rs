// ============================================================================
// Concurrent Access
// Many threads driving one book through its public interface
// ============================================================================

use mm_orderbook::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::thread;

const THREADS: u64 = 8;
const ORDERS_PER_THREAD: u64 = 500;

#[test]
fn concurrent_submissions_keep_book_consistent() {
    let recorder = Arc::new(RecordingEventHandler::new());
    let engine = Arc::new(
        MatchingEngineBuilder::from_config(BookConfig::simulation_default())
            .with_event_handler(recorder.clone())
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let mut submitted = 0;
                let mut unfilled = 0;

                for i in 0..ORDERS_PER_THREAD {
                    let side = if (worker + i) % 2 == 0 { Side::Buy } else { Side::Sell };
                    let cents = 9_950 + ((worker * 31 + i * 17) % 100) as i64;
                    let quantity = 1 + (i % 10);

                    let execution = if i % 7 == 0 {
                        engine.submit_market_order(side, quantity).unwrap()
                    } else {
                        engine
                            .submit_limit_order(side, Decimal::new(cents, 2), quantity)
                            .unwrap()
                    };
                    submitted += quantity;
                    unfilled += execution.unfilled_quantity;

                    if execution.is_resting() && i % 5 == 0 {
                        // May already be filled by another thread
                        match engine.cancel_order(execution.order_id) {
                            Ok(()) | Err(BookError::UnknownOrder { .. }) => {},
                            Err(err) => panic!("unexpected cancel failure: {err}"),
                        }
                    }

                    assert!(!engine.top_of_book().is_crossed());
                }

                (submitted, unfilled)
            })
        })
        .collect();

    let mut submitted = 0;
    let mut unfilled = 0;
    for handle in handles {
        let (s, u) = handle.join().unwrap();
        submitted += s;
        unfilled += u;
    }

    let traded: Quantity = recorder.trades().iter().map(|t| t.quantity).sum();
    let cancelled: Quantity = recorder
        .events()
        .iter()
        .filter_map(|event| match event {
            OrderEvent::OrderCancelled {
                remaining_quantity, ..
            } => Some(*remaining_quantity),
            _ => None,
        })
        .sum();
    let resting = engine.total_quantity(Side::Buy) + engine.total_quantity(Side::Sell);

    assert!(!engine.top_of_book().is_crossed());
    assert_eq!(submitted, resting + 2 * traded + cancelled + unfilled);

    let mut trade_ids: Vec<u64> = recorder.trades().iter().map(|t| t.id).collect();
    trade_ids.sort_unstable();
    assert!(trade_ids.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn readers_observe_consistent_snapshots() {
    let engine = Arc::new(
        create_from_config(BookConfig::simulation_default(), Arc::new(NoOpEventHandler)).unwrap(),
    );

    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..2_000i64 {
                let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
                let cents = 9_990 + (i % 20);
                engine
                    .submit_limit_order(side, Decimal::new(cents, 2), 3)
                    .unwrap();
            }
        })
    };

    let reader = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for _ in 0..2_000 {
                let snapshot = engine.depth_snapshot(5);
                if let (Some(bid), Some(ask)) = (snapshot.best_bid(), snapshot.best_ask()) {
                    assert!(bid < ask);
                }
                assert!(snapshot.bids.windows(2).all(|w| w[0].0 > w[1].0));
                assert!(snapshot.asks.windows(2).all(|w| w[0].0 < w[1].0));
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
}
