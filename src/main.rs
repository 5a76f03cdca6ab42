//! critbit-lob demo binary.
//!
//! Builds a small market, rests a few orders, sweeps the asks with a
//! market buy and prints the book. Set `RUST_LOG=critbit_lob=debug` (or
//! `trace`) to see the engine's events.

use critbit_lob::types::units::{from_subunits, lot_size, to_subunits};
use critbit_lob::{BookConfig, CoinType, Market, Side, NO_CUSTODIAN};
use tracing_subscriber::EnvFilter;

/// Base coin decimals (8, BTC-like)
const BASE_DECIMALS: u32 = 8;

/// Quote coin decimals (6, USDC-like)
const QUOTE_DECIMALS: u32 = 6;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("===========================================");
    println!("  critbit-lob");
    println!("===========================================");
    println!();

    // One lot = 0.001 base
    let scale_factor = lot_size("0.001", BASE_DECIMALS).ok_or("bad lot size")?;
    let config = BookConfig::default()
        .with_scale_factor(scale_factor)
        .with_capacity(1_024);
    let mut market = Market::from_config(&config)?;

    let (maker, taker) = (1, 2);
    for account in [maker, taker] {
        market.register_account(account)?;
        market.deposit(
            account,
            CoinType::Base,
            to_subunits("10", BASE_DECIMALS).ok_or("bad amount")?,
        )?;
        market.deposit(
            account,
            CoinType::Quote,
            to_subunits("100000", QUOTE_DECIMALS).ok_or("bad amount")?,
        )?;
    }

    // Prices are quote subunits per lot: 50.00 quote per 0.001 base
    let price = |s: &str| to_subunits(s, QUOTE_DECIMALS).ok_or("bad price");
    market.place_limit_order(maker, NO_CUSTODIAN, Side::Ask, 5, price("50.10")?)?;
    market.place_limit_order(maker, NO_CUSTODIAN, Side::Ask, 5, price("50.10")?)?;
    market.place_limit_order(maker, NO_CUSTODIAN, Side::Ask, 3, price("50.00")?)?;
    market.place_limit_order(maker, NO_CUSTODIAN, Side::Bid, 4, price("49.90")?)?;

    print_book(&market);

    println!("Market buy: 6 lots, budget 1000 quote...");
    let result = market.submit_market_buy(taker, 6, price("1000")?)?;
    for fill in &result.fills {
        println!(
            "  fill {:>3} lots @ {} (maker order {:#x})",
            fill.base_lots,
            from_subunits(fill.price(), QUOTE_DECIMALS),
            fill.maker_order_id
        );
    }
    println!(
        "  bought {} base for {} quote",
        from_subunits(result.base, BASE_DECIMALS),
        from_subunits(result.quote, QUOTE_DECIMALS)
    );
    println!();

    print_book(&market);

    let base = market.balance(taker, CoinType::Base)?;
    let quote = market.balance(taker, CoinType::Quote)?;
    println!("Taker balances:");
    println!("  base:  {}", from_subunits(base.total, BASE_DECIMALS));
    println!("  quote: {}", from_subunits(quote.total, QUOTE_DECIMALS));
    println!();
    println!("State root: {}", market.book().state_root_hex()?);

    Ok(())
}

fn print_book(market: &Market) {
    println!("Book:");
    for level in market.book().price_levels(Side::Ask).iter().rev() {
        println!(
            "  ask {:>12} | {:>4} lots ({} orders)",
            from_subunits(level.price, QUOTE_DECIMALS),
            level.base_lots,
            level.order_count
        );
    }
    println!("  ----------------------------------");
    for level in market.book().price_levels(Side::Bid) {
        println!(
            "  bid {:>12} | {:>4} lots ({} orders)",
            from_subunits(level.price, QUOTE_DECIMALS),
            level.base_lots,
            level.order_count
        );
    }
    println!();
}
