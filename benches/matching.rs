//! Benchmarks for the crit-bit tree and order book.
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run a specific group
//! cargo bench -- market_order
//! ```
//!
//! Results are saved to `target/criterion/` with HTML reports.

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use std::time::Duration;

use critbit_lob::{BookConfig, CoinType, CritBitTree, Direction, Market, Side, NO_CUSTODIAN};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SCALE_FACTOR: u64 = 1_000;

// ============================================================================
// HELPER FUNCTIONS - Deterministic setup
// ============================================================================

/// Random keys from a fixed seed
fn random_keys(count: usize, seed: u64) -> Vec<u128> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen()).collect()
}

fn tree_with(keys: &[u128]) -> CritBitTree<u64> {
    let mut tree = CritBitTree::with_capacity(keys.len());
    for (i, &k) in keys.iter().enumerate() {
        // Random u128 collisions are not a concern at these sizes
        let _ = tree.insert(k, i as u64);
    }
    tree
}

/// Market with a maker (account 1) and a taker (account 2), both funded
fn funded_market(capacity: usize) -> Market {
    let config = BookConfig::default()
        .with_scale_factor(SCALE_FACTOR)
        .with_capacity(capacity);
    let mut market = Market::from_config(&config).expect("valid config");
    for account in [1, 2] {
        market.register_account(account).expect("fresh account");
        market.deposit(account, CoinType::Base, u64::MAX / 4).expect("deposit");
        market.deposit(account, CoinType::Quote, u64::MAX / 4).expect("deposit");
    }
    market
}

/// Rest `count` one-lot asks from the maker, one per price step
fn populate_asks(market: &mut Market, count: usize, base_price: u64) {
    for i in 0..count {
        market
            .place_limit_order(1, NO_CUSTODIAN, Side::Ask, 1, base_price + i as u64)
            .expect("ask rests");
    }
}

// ============================================================================
// BENCHMARK: Tree operations
// ============================================================================

fn bench_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("critbit");

    for &size in &[1_000usize, 10_000, 100_000] {
        let keys = random_keys(size, 42);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("insert", size), &keys, |b, keys| {
            b.iter(|| black_box(tree_with(keys)));
        });

        let tree = tree_with(&keys);
        group.bench_with_input(BenchmarkId::new("lookup", size), &keys, |b, keys| {
            b.iter(|| {
                for &k in keys {
                    black_box(tree.has_key(k));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("drain_ascending", size), &keys, |b, keys| {
            b.iter_batched(
                || tree_with(keys),
                |mut tree| {
                    let mut cursor = tree.traverse_init(Direction::Successor).ok();
                    while let Some(c) = cursor {
                        cursor = tree.traverse_pop(c, Direction::Successor).1;
                    }
                    tree
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

// ============================================================================
// BENCHMARK: Limit order placement
// ============================================================================

fn bench_place(c: &mut Criterion) {
    let mut group = c.benchmark_group("place_limit_order");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("into_10k_book", |b| {
        b.iter_batched(
            || {
                let mut market = funded_market(20_000);
                populate_asks(&mut market, 10_000, 10_000);
                market
            },
            |mut market| {
                for i in 0..100u64 {
                    let _ = market.place_limit_order(
                        1,
                        NO_CUSTODIAN,
                        Side::Bid,
                        1,
                        black_box(5_000 + i),
                    );
                }
                market
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

// ============================================================================
// BENCHMARK: Market order sweeps
// ============================================================================

fn bench_market_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("market_order");
    group.measurement_time(Duration::from_secs(5));

    for &levels in &[1usize, 10, 100] {
        group.throughput(Throughput::Elements(levels as u64));
        group.bench_with_input(BenchmarkId::new("sweep_levels", levels), &levels, |b, &levels| {
            b.iter_batched(
                || {
                    let mut market = funded_market(1_000);
                    populate_asks(&mut market, 1_000, 10_000);
                    market
                },
                |mut market| {
                    let result = market
                        .submit_market_buy(2, levels as u64, u64::MAX / 8)
                        .expect("buy fills");
                    black_box(result);
                    market
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tree, bench_place, bench_market_order);
criterion_main!(benches);
