//! Core data types for the order book.
//!
//! ## Types
//!
//! - [`Order`]: the value stored under each resting order id
//! - [`Side`]: Bid or Ask
//! - [`OrderId`]: 128-bit sortable id, see [`order_id`]
//! - [`Fill`] / [`MarketFill`]: results of matching
//!
//! ## Integer Arithmetic
//!
//! Sizes are lots, prices are quote subunits per lot. Decimal conversions
//! live in [`units`].

mod fill;
mod order;
pub mod order_id;
pub mod units;

// Re-export all types at module level
pub use fill::{Fill, MarketFill};
pub use order::{AccountId, Order, Side, NO_CUSTODIAN};
pub use order_id::OrderId;
