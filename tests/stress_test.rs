//! Stress tests for the crit-bit order book.
//!
//! These tests verify:
//! 1. The book stays structurally sound under long random workloads
//! 2. Spread makers always match the trees' true extrema
//! 3. Collateral is conserved across placement, cancel and matching
//! 4. Determinism: same seed, same state root
//!
//! ## Running Stress Tests
//!
//! ```bash
//! cargo test --release --test stress_test -- --nocapture
//! ```

use std::time::Instant;

use critbit_lob::{
    BookError, CoinType, Market, OrderBook, OrderId, Side, MAX_BID_DEFAULT, MIN_ASK_DEFAULT,
    NO_CUSTODIAN,
};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

/// Operations for the long-running workload
const STRESS_OP_COUNT: usize = 200_000;

const ACCOUNTS: u64 = 20;

const SCALE_FACTOR: u64 = 1_000;

/// Prices are drawn around this mid
const MID_PRICE: u64 = 10_000;

const STARTING_BASE: u64 = 1_000_000_000_000;
const STARTING_QUOTE: u64 = 10_000_000_000_000;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn funded_market(capacity: usize) -> Market {
    let config = critbit_lob::BookConfig::default()
        .with_scale_factor(SCALE_FACTOR)
        .with_capacity(capacity);
    let mut market = Market::from_config(&config).unwrap();
    for account in 1..=ACCOUNTS {
        market.register_account(account).unwrap();
        market.deposit(account, CoinType::Base, STARTING_BASE).unwrap();
        market.deposit(account, CoinType::Quote, STARTING_QUOTE).unwrap();
    }
    market
}

#[derive(Debug, Default)]
struct Counts {
    placed: usize,
    crossed: usize,
    cancelled: usize,
    missing: usize,
    market_orders: usize,
    fills: usize,
    self_matches: usize,
}

/// Apply one random operation. Every error must be one the book documents.
fn random_op(
    market: &mut Market,
    rng: &mut ChaCha8Rng,
    resting: &mut Vec<(Side, OrderId, u64)>,
    counts: &mut Counts,
) {
    let account = rng.gen_range(1..=ACCOUNTS);
    match rng.gen_range(0..10) {
        // Limit orders
        0..=5 => {
            let side = if rng.gen_bool(0.5) { Side::Bid } else { Side::Ask };
            let price = MID_PRICE - 200 + rng.gen_range(0..=400);
            let lots = rng.gen_range(1..=50);
            match market.place_limit_order(account, NO_CUSTODIAN, side, lots, price) {
                Ok(id) => {
                    counts.placed += 1;
                    resting.push((side, id, account));
                }
                Err(BookError::CrossedSpread { .. }) => counts.crossed += 1,
                Err(err) => panic!("unexpected placement error: {err}"),
            }
        }
        // Cancels (the order may already be gone)
        6..=7 => {
            if resting.is_empty() {
                return;
            }
            let idx = rng.gen_range(0..resting.len());
            let (side, id, owner) = resting.swap_remove(idx);
            match market.cancel_order(owner, NO_CUSTODIAN, side, id) {
                Ok(_) => counts.cancelled += 1,
                Err(BookError::OrderNotFound(_)) => counts.missing += 1,
                Err(err) => panic!("unexpected cancel error: {err}"),
            }
        }
        // Market orders
        _ => {
            let lots = rng.gen_range(1..=120);
            let result = if rng.gen_bool(0.5) {
                market.submit_market_buy(account, lots, lots * (MID_PRICE + 200))
            } else {
                market.submit_market_sell(account, lots)
            };
            match result {
                Ok(fill) => {
                    counts.market_orders += 1;
                    counts.fills += fill.fills.len();
                }
                Err(BookError::SelfMatch) => counts.self_matches += 1,
                Err(err) => panic!("unexpected market order error: {err}"),
            }
        }
    }
}

fn assert_spread_makers(book: &OrderBook) {
    let asks = book.tree(Side::Ask);
    let bids = book.tree(Side::Bid);
    assert_eq!(book.min_ask(), asks.min_key().unwrap_or(MIN_ASK_DEFAULT));
    assert_eq!(book.max_bid(), bids.max_key().unwrap_or(MAX_BID_DEFAULT));
    if let Some(spread) = book.spread() {
        assert!(spread > 0, "book is crossed");
    }
}

/// Run a seeded workload and return the final state root.
fn run_deterministic_sequence(seed: u64, count: usize) -> [u8; 32] {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut market = funded_market(count);
    let mut resting = Vec::new();
    let mut counts = Counts::default();

    for _ in 0..count {
        random_op(&mut market, &mut rng, &mut resting, &mut counts);
    }
    market.book().compute_state_root().unwrap()
}

// ============================================================================
// STRESS TESTS
// ============================================================================

/// Long random workload.
///
/// # Verification
/// - No panics
/// - Trees well formed and spread makers exact at the end
/// - Both coins conserved
/// - Some matching occurred
#[test]
fn stress_random_workload() {
    println!("\n=== STRESS TEST: {} operations ===\n", STRESS_OP_COUNT);

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut market = funded_market(STRESS_OP_COUNT);
    let mut resting = Vec::new();
    let mut counts = Counts::default();

    let start = Instant::now();
    for _ in 0..STRESS_OP_COUNT {
        random_op(&mut market, &mut rng, &mut resting, &mut counts);
    }
    let elapsed = start.elapsed();

    let book = market.book();
    println!("=== RESULTS ===");
    println!("  {:#?}", counts);
    println!("  Resting asks:      {:>12}", book.n_asks());
    println!("  Resting bids:      {:>12}", book.n_bids());
    println!("  Elapsed time:      {:>12.2?}", elapsed);
    println!(
        "  Throughput:        {:>12.0} ops/sec",
        STRESS_OP_COUNT as f64 / elapsed.as_secs_f64()
    );
    println!("  State root:        {}", book.state_root_hex().unwrap());

    assert!(book.tree(Side::Ask).is_well_formed());
    assert!(book.tree(Side::Bid).is_well_formed());
    assert_spread_makers(book);

    let ledger = market.ledger();
    assert_eq!(
        ledger.total_supply(CoinType::Base),
        u128::from(STARTING_BASE) * u128::from(ACCOUNTS)
    );
    assert_eq!(
        ledger.total_supply(CoinType::Quote),
        u128::from(STARTING_QUOTE) * u128::from(ACCOUNTS)
    );
    assert!(counts.fills > 0, "expected some fills");
    assert!(counts.crossed > 0, "expected some crossing rejections");
}

/// Check invariants after every single operation on a shorter run.
#[test]
fn stress_invariants_every_step() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut market = funded_market(0);
    let mut resting = Vec::new();
    let mut counts = Counts::default();

    for step in 0..3_000 {
        random_op(&mut market, &mut rng, &mut resting, &mut counts);

        let book = market.book();
        assert!(book.tree(Side::Ask).is_well_formed(), "asks malformed at step {step}");
        assert!(book.tree(Side::Bid).is_well_formed(), "bids malformed at step {step}");
        assert_spread_makers(book);
    }
}

/// Locked collateral always equals what the resting orders require.
#[test]
fn stress_locked_matches_resting() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut market = funded_market(0);
    let mut resting = Vec::new();
    let mut counts = Counts::default();

    for _ in 0..5_000 {
        random_op(&mut market, &mut rng, &mut resting, &mut counts);
    }

    let book = market.book();
    for account in 1..=ACCOUNTS {
        let mut base = 0u64;
        let mut quote = 0u64;
        for order in book.orders(Side::Ask).iter().filter(|o| o.owner == account) {
            base += order.base_lots * SCALE_FACTOR;
        }
        for order in book.orders(Side::Bid).iter().filter(|o| o.owner == account) {
            quote += order.base_lots * order.price;
        }
        assert_eq!(market.balance(account, CoinType::Base).unwrap().locked(), base);
        assert_eq!(market.balance(account, CoinType::Quote).unwrap().locked(), quote);
    }
}

/// Verify determinism: same sequence produces identical state root.
#[test]
fn verify_determinism() {
    println!("\n=== DETERMINISM TEST ===\n");

    const TEST_COUNT: usize = 10_000;
    const SEED: u64 = 12345;

    let root1 = run_deterministic_sequence(SEED, TEST_COUNT);
    let root2 = run_deterministic_sequence(SEED, TEST_COUNT);

    println!("  Run 1 state root: {}", hex::encode(root1));
    println!("  Run 2 state root: {}", hex::encode(root2));
    assert_eq!(root1, root2, "State roots must match for determinism");

    let root3 = run_deterministic_sequence(SEED + 1, TEST_COUNT);
    println!("  Different seed:   {}", hex::encode(root3));
    assert_ne!(root1, root3, "Different seeds should produce different roots");
}

/// Fill a deep book and drain it completely with market orders.
#[test]
fn stress_drain_book() {
    let mut market = funded_market(20_000);
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    for _ in 0..10_000 {
        let account = rng.gen_range(2..=ACCOUNTS);
        let lots = rng.gen_range(1..=10);
        market
            .place_limit_order(
                account,
                NO_CUSTODIAN,
                Side::Ask,
                lots,
                rng.gen_range(10_001..=11_000),
            )
            .unwrap();
        market
            .place_limit_order(
                account,
                NO_CUSTODIAN,
                Side::Bid,
                lots,
                rng.gen_range(9_000..=9_999),
            )
            .unwrap();
    }

    let ask_lots = market.book().depth(Side::Ask);
    let bid_lots = market.book().depth(Side::Bid);

    // Account 1 owns nothing, so it can sweep both sides
    let buy = market.submit_market_buy(1, u64::MAX / 2, STARTING_QUOTE).unwrap();
    let sell = market.submit_market_sell(1, bid_lots).unwrap();

    assert_eq!(buy.base_lots, ask_lots);
    assert_eq!(sell.base_lots, bid_lots);
    assert!(market.book().is_empty());
    assert_eq!(market.book().min_ask(), MIN_ASK_DEFAULT);
    assert_eq!(market.book().max_bid(), MAX_BID_DEFAULT);
}
