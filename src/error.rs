//! Error types for the crit-bit tree, collateral ledger and order book.
//!
//! Every public operation validates before it mutates, so any error
//! returned here means the call had no effect. None of these are transient:
//! resubmitting the same call fails the same way.

use thiserror::Error;

use crate::collateral::CoinType;
use crate::types::{AccountId, OrderId, Side};

/// Failures of [`CritBitTree`](crate::critbit::CritBitTree) operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    #[error("key {0:#x} already present")]
    DuplicateKey(u128),

    #[error("key {0:#x} not found")]
    KeyNotFound(u128),

    #[error("tree is empty")]
    EmptyTree,

    /// The tag bit in child references caps the number of outer nodes.
    #[error("tree is full")]
    TreeFull,

    #[error("cannot destroy a non-empty tree")]
    NotEmpty,
}

/// Failures of the collateral collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollateralError {
    #[error("account {account} lacks {coin:?} collateral: need {required}, have {available}")]
    InsufficientCollateral {
        account: AccountId,
        coin: CoinType,
        required: u64,
        available: u64,
    },

    #[error("account {0} is not registered")]
    UnknownAccount(AccountId),

    #[error("account {0} is already registered")]
    AccountExists(AccountId),

    #[error("balance overflow")]
    Overflow,
}

/// Failures of order book operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("{side:?} at price {price} crosses the spread (best opposing price {best})")]
    CrossedSpread { side: Side, price: u64, best: u64 },

    /// Collateral could not be reserved or the account is unknown.
    #[error(transparent)]
    Collateral(#[from] CollateralError),

    #[error("order {0:#x} not found")]
    OrderNotFound(OrderId),

    #[error("caller is not authorized to manage this order")]
    Unauthorized,

    #[error("invalid quantity")]
    InvalidQuantity,

    #[error("invalid price")]
    InvalidPrice,

    #[error("taker would match against its own resting order")]
    SelfMatch,

    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// SSZ encoding of a resting order failed while hashing the book.
    #[error("state encoding failed: {0}")]
    Encoding(String),
}

/// Invalid [`BookConfig`](crate::config::BookConfig) values.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("scale factor must be non-zero")]
    ZeroScaleFactor,
}

pub type TreeResult<T> = Result<T, TreeError>;
pub type BookResult<T> = Result<T, BookError>;
