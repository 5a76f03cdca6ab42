//! Order id encoding.
//!
//! An order id packs the price into the high 64 bits and a per-book
//! sequence number into the low 64 bits, so a single `u128` comparison
//! orders the whole book by price and then by age.
//!
//! ```text
//! | 127 ........ 64 | 63 ............................. 0 |
//! |      price      | sequence (ask) / !sequence (bid)  |
//! ```
//!
//! Bids store the bitwise complement of the sequence number. At a fixed
//! price, older bids therefore get *larger* ids, and a descending walk over
//! the bid tree (best price first) still visits the oldest order first.

use crate::types::Side;

/// 128-bit sortable order identifier.
pub type OrderId = u128;

const FIRST_64: u32 = 64;
const HI_64: u64 = u64::MAX;

/// Build the order id for `price`, `sequence` and `side`.
///
/// ```
/// use critbit_lob::types::{order_id, Side};
///
/// let older = order_id::order_id(100, 0, Side::Bid);
/// let newer = order_id::order_id(100, 1, Side::Bid);
/// assert!(older > newer);
/// ```
#[inline]
pub fn order_id(price: u64, sequence: u64, side: Side) -> OrderId {
    let low = match side {
        Side::Ask => sequence,
        Side::Bid => sequence ^ HI_64,
    };
    (u128::from(price) << FIRST_64) | u128::from(low)
}

/// Price encoded in the top 64 bits.
#[inline]
pub fn price(id: OrderId) -> u64 {
    (id >> FIRST_64) as u64
}

#[inline]
pub fn sequence_from_ask(id: OrderId) -> u64 {
    id as u64
}

#[inline]
pub fn sequence_from_bid(id: OrderId) -> u64 {
    (id as u64) ^ HI_64
}

/// Sequence number of an id built for `side`.
#[inline]
pub fn sequence(id: OrderId, side: Side) -> u64 {
    match side {
        Side::Ask => sequence_from_ask(id),
        Side::Bid => sequence_from_bid(id),
    }
}
