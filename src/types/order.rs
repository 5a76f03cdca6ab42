//! Order types stored in the book.
//!
//! ## SSZ Serialization
//!
//! `Order` derives `SimpleSerialize` from ssz_rs so the book can hash its
//! resting orders into a deterministic state root. All fields are `u64`,
//! which SSZ encodes as fixed-size little-endian words.
//!
//! ## Quantities
//!
//! Sizes are counted in lots. One lot is `scale_factor` base subunits,
//! where the scale factor is fixed per book.

use ssz_rs::prelude::*;

/// Account identifier, supplied by the caller.
pub type AccountId = u64;

/// Custodian id meaning "the owner acts directly".
pub const NO_CUSTODIAN: u64 = 0;

// ============================================================================
// Side enum
// ============================================================================

/// Side of a resting order.
///
/// Bids and asks use opposite tie-break polarity inside the order id, see
/// [`order_id`](crate::types::order_id::order_id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Buy interest, best = highest price
    Bid,
    /// Sell interest, best = lowest price
    Ask,
}

impl Side {
    /// Returns the opposite side
    pub fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

// ============================================================================
// Order struct
// ============================================================================

/// A resting limit order, the value stored under its order id.
///
/// Price, sequence number and side live in the key, not here.
///
/// ## Example
///
/// ```
/// use critbit_lob::types::{Order, NO_CUSTODIAN};
///
/// let mut order = Order::new(25, 7, NO_CUSTODIAN);
/// assert_eq!(order.fill(10), 10);
/// assert_eq!(order.base_lots, 15);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct Order {
    /// Remaining size in lots, decremented in place on partial fills
    pub base_lots: u64,

    /// Account that owns the order and its reserved collateral
    pub owner: u64,

    /// Custodian allowed to manage the order, `NO_CUSTODIAN` if none
    pub custodian_id: u64,
}

impl Order {
    pub fn new(base_lots: u64, owner: AccountId, custodian_id: u64) -> Self {
        Self {
            base_lots,
            owner,
            custodian_id,
        }
    }

    /// Fill up to `lots`, returning the amount actually filled.
    #[inline]
    pub fn fill(&mut self, lots: u64) -> u64 {
        let filled = lots.min(self.base_lots);
        self.base_lots -= filled;
        filled
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.base_lots == 0
    }

    /// Whether `account` acting through `custodian_id` may manage this order.
    #[inline]
    pub fn is_managed_by(&self, account: AccountId, custodian_id: u64) -> bool {
        self.owner == account && self.custodian_id == custodian_id
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
