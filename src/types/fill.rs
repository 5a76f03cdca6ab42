//! Fill records produced by the matching routine.
//!
//! ## Terminology
//!
//! - **Maker**: the resting order that was already in the book
//! - **Taker**: the incoming market order that consumed it
//!
//! A fill always executes at the maker's price, which is encoded in the
//! maker's order id.

use crate::types::{order_id, AccountId, OrderId, Side};

/// A single match between a taker and one resting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    /// Id of the resting (maker) order
    pub maker_order_id: OrderId,

    /// Owner of the resting order
    pub maker: AccountId,

    /// Account that submitted the market order
    pub taker: AccountId,

    /// Size matched, in lots
    pub base_lots: u64,

    /// Base subunits routed (`base_lots * scale_factor`)
    pub base: u64,

    /// Quote subunits routed (`base_lots * price`)
    pub quote: u64,

    /// True when the maker order left the book
    pub maker_complete: bool,
}

impl Fill {
    /// Execution price (the maker's price)
    #[inline]
    pub fn price(&self) -> u64 {
        order_id::price(self.maker_order_id)
    }
}

/// Summary of one market order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketFill {
    /// Side of the book that was consumed
    pub side_taken: Side,

    /// Total lots matched
    pub base_lots: u64,

    /// Total base subunits routed
    pub base: u64,

    /// Total quote subunits routed
    pub quote: u64,

    /// Individual fills, best price first
    pub fills: Vec<Fill>,
}

impl MarketFill {
    pub fn empty(side_taken: Side) -> Self {
        Self {
            side_taken,
            base_lots: 0,
            base: 0,
            quote: 0,
            fills: Vec::new(),
        }
    }

    /// Record one fill and update the running totals.
    pub fn push(&mut self, fill: Fill) {
        self.base_lots += fill.base_lots;
        self.base += fill.base;
        self.quote += fill.quote;
        self.fills.push(fill);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }

    /// Volume-weighted average price in quote subunits per lot, if any
    /// lots were matched.
    pub fn average_price(&self) -> Option<u64> {
        if self.base_lots == 0 {
            None
        } else {
            Some(self.quote / self.base_lots)
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_at(price: u64, lots: u64) -> Fill {
        Fill {
            maker_order_id: order_id::order_id(price, 0, Side::Ask),
            maker: 1,
            taker: 2,
            base_lots: lots,
            base: lots * 10,
            quote: lots * price,
            maker_complete: true,
        }
    }

    #[test]
    fn test_fill_price_from_maker_id() {
        assert_eq!(fill_at(90, 5).price(), 90);
    }

    #[test]
    fn test_market_fill_totals() {
        let mut summary = MarketFill::empty(Side::Ask);
        assert!(summary.is_empty());
        assert_eq!(summary.average_price(), None);

        summary.push(fill_at(90, 5));
        summary.push(fill_at(100, 5));

        assert_eq!(summary.base_lots, 10);
        assert_eq!(summary.base, 100);
        assert_eq!(summary.quote, 950);
        assert_eq!(summary.average_price(), Some(95));
    }
}
