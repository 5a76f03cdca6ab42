//! Order book module.
//!
//! ## Architecture
//!
//! One [`OrderBook`] per market, holding two crit-bit trees keyed by order
//! id:
//!
//! - **Asks**: best = minimum key, consumed in ascending order
//! - **Bids**: best = maximum key, consumed in descending order
//! - **Spread makers**: cached best keys for O(1) crossing checks
//!
//! ## Components
//!
//! - [`OrderBook`]: placement, cancellation, privileged fills and removals
//! - [`BookCap`]: capability required by privileged operations
//! - `matching`: [`OrderBook::fill_market_order`]
//! - [`PriceLevel`] / [`RestingOrder`]: depth views
//!
//! ## Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | Place limit order | O(log n) |
//! | Cancel order | O(log n) |
//! | Best bid/ask | O(1) |
//! | Market order | O(log n + k) for k fills |
//!
//! Tree depth is bounded by the 128 key bits.

mod book;
mod depth;
mod matching;

pub use book::{BookCap, OrderBook, MAX_BID_DEFAULT, MIN_ASK_DEFAULT};
pub use depth::{PriceLevel, RestingOrder};
