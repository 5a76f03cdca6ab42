//! Read-only depth views of the book.
//!
//! ## Design
//!
//! Resting orders at one price are adjacent in the tree (the price is the
//! top half of the key), so a single best-first walk both lists orders
//! and aggregates them into price levels:
//!
//! ```text
//! asks:  90 [5] | 100 [5, 5]      -> levels (90, 5, 1), (100, 10, 2)
//! bids: 80 [4, 1] | 70 [2]        -> levels (80, 5, 2), (70, 2, 1)
//! ```

use crate::orderbook::OrderBook;
use crate::types::order_id::{self, OrderId};
use crate::types::{AccountId, Order, Side};

/// One resting order as seen from outside the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestingOrder {
    pub order_id: OrderId,
    pub price: u64,
    pub base_lots: u64,
    pub owner: AccountId,
}

/// Aggregated size at a single price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLevel {
    pub price: u64,

    /// Sum of remaining lots at this price
    pub base_lots: u64,

    /// Number of orders at this price
    pub order_count: usize,
}

impl PriceLevel {
    fn new(price: u64) -> Self {
        Self {
            price,
            base_lots: 0,
            order_count: 0,
        }
    }

    fn push(&mut self, base_lots: u64) {
        self.base_lots = self.base_lots.saturating_add(base_lots);
        self.order_count += 1;
    }
}

impl OrderBook {
    /// Orders on `side` in matching priority (best price, then oldest)
    fn walk_best_first(&self, side: Side) -> Box<dyn Iterator<Item = (u128, &Order)> + '_> {
        let iter = self.tree(side).iter();
        match side {
            Side::Ask => Box::new(iter),
            Side::Bid => Box::new(iter.rev()),
        }
    }

    /// Every resting order on `side`, best first.
    pub fn orders(&self, side: Side) -> Vec<RestingOrder> {
        self.walk_best_first(side)
            .map(|(id, order)| RestingOrder {
                order_id: id,
                price: order_id::price(id),
                base_lots: order.base_lots,
                owner: order.owner,
            })
            .collect()
    }

    /// Size aggregated by price on `side`, best first.
    pub fn price_levels(&self, side: Side) -> Vec<PriceLevel> {
        let mut levels: Vec<PriceLevel> = Vec::new();
        for (id, order) in self.walk_best_first(side) {
            let price = order_id::price(id);
            match levels.last_mut() {
                Some(level) if level.price == price => level.push(order.base_lots),
                _ => {
                    let mut level = PriceLevel::new(price);
                    level.push(order.base_lots);
                    levels.push(level);
                }
            }
        }
        levels
    }

    /// Total lots resting on `side`
    pub fn depth(&self, side: Side) -> u64 {
        self.tree(side)
            .iter()
            .fold(0u64, |acc, (_, order)| acc.saturating_add(order.base_lots))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
