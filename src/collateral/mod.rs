//! Collateral bookkeeping consumed by the order book.
//!
//! ## Boundary
//!
//! The book never reads balances. It calls three operations through the
//! [`Collateral`] trait:
//!
//! - `reserve` when an order rests (available -> locked)
//! - `release` when an order leaves without trading (locked -> available)
//! - `route` when a fill settles (sender's locked -> receiver's available)
//!
//! [`Ledger`] is the in-memory implementation used by the
//! [`Market`](crate::engine::Market) facade and the tests.

mod ledger;

pub use ledger::{Balance, Ledger};

use crate::error::CollateralError;
use crate::types::AccountId;

/// The two coins of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CoinType {
    /// The traded asset, moved in multiples of the scale factor
    Base,
    /// The pricing asset
    Quote,
}

/// Balance operations the order book relies on.
pub trait Collateral {
    /// Lock `amount` of the account's available balance.
    fn reserve(
        &mut self,
        account: AccountId,
        coin: CoinType,
        amount: u64,
    ) -> Result<(), CollateralError>;

    /// Return `amount` of previously reserved balance to available.
    fn release(
        &mut self,
        account: AccountId,
        coin: CoinType,
        amount: u64,
    ) -> Result<(), CollateralError>;

    /// Move `amount` of `from`'s reserved balance to `to`, where it
    /// arrives available.
    ///
    /// Must succeed whenever `from` has `amount` locked: the book routes
    /// mid-walk and treats a failure there as a broken invariant.
    fn route(
        &mut self,
        from: AccountId,
        to: AccountId,
        coin: CoinType,
        amount: u64,
    ) -> Result<(), CollateralError>;
}
