//! # critbit-lob
//!
//! In-memory limit order book built on an arena-backed crit-bit tree.
//!
//! ## Architecture
//!
//! - **Types**: order ids, resting orders, fills, unit conversions
//! - **CritBit**: ordered `u128` map with cursor traversal
//! - **OrderBook**: two trees, spread makers, placement, cancel, matching
//! - **Collateral**: the balance boundary the book calls into, plus an
//!   in-memory ledger
//! - **Engine**: `Market` facade tying a book to its ledger
//!
//! ## Design Principles
//!
//! 1. **Determinism**: identical call sequences give identical state roots
//! 2. **No Floating Point**: lots, prices and subunits are all integers
//! 3. **Arena Storage**: tree nodes live in two vectors linked by index
//! 4. **Synchronous Execution**: every call runs to completion, validating
//!    before it mutates

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: OrderId, Order, Side, Fill
pub mod types;

/// Crit-bit tree over `u128` keys
pub mod critbit;

/// Order book: two crit-bit trees and matching
pub mod orderbook;

/// Collateral boundary and in-memory ledger
pub mod collateral;

/// Market facade
pub mod engine;

/// Book configuration
pub mod config;

/// Error types
pub mod error;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use collateral::{Balance, CoinType, Collateral, Ledger};
pub use config::BookConfig;
pub use critbit::{CritBitTree, Cursor, Direction};
pub use engine::Market;
pub use error::{BookError, CollateralError, ConfigError, TreeError};
pub use orderbook::{
    BookCap, OrderBook, PriceLevel, RestingOrder, MAX_BID_DEFAULT, MIN_ASK_DEFAULT,
};
pub use types::{AccountId, Fill, MarketFill, Order, OrderId, Side, NO_CUSTODIAN};
