//! Market order matching against one side of the book.
//!
//! ## Rules
//!
//! - Asks are consumed lowest key first (ascending), bids highest key
//!   first (descending); either way that is best price, then oldest
//! - Every fill executes at the resting order's price
//! - Size per resting order is bounded by the lots still wanted, the
//!   resting size and, when taking asks, `quote_left / price`
//! - A fully consumed order is popped and the walk continues; a partial
//!   fill decrements it in place and ends the walk
//!
//! ## Atomicity
//!
//! A read-only plan pass walks the same orders first. If the taker would
//! meet one of its own resting orders the call fails with `SelfMatch`
//! before anything changes.

use tracing::{debug, trace, warn};

use crate::collateral::Collateral;
use crate::critbit::Direction;
use crate::error::{BookError, BookResult};
use crate::orderbook::book::{settle, BookCap, OrderBook};
use crate::types::order_id;
use crate::types::{AccountId, MarketFill, Side};

/// Walk direction that visits `side` best-first
#[inline]
fn best_first(side: Side) -> Direction {
    match side {
        Side::Ask => Direction::Successor,
        Side::Bid => Direction::Predecessor,
    }
}

/// Lots to take from one resting order.
///
/// `quote_left` only binds when taking asks (the taker is spending quote).
#[inline]
fn fill_size(side: Side, price: u64, resting: u64, lots_left: u64, quote_left: u64) -> u64 {
    let lots = lots_left.min(resting);
    match side {
        Side::Ask => lots.min(quote_left / price),
        Side::Bid => lots,
    }
}

impl OrderBook {
    /// Fill a market order against `side_to_take`.
    ///
    /// Takes at most `max_base_lots` lots and, when taking asks, spends at
    /// most `max_quote` quote subunits. The taker's outgoing collateral
    /// must already be reserved by the caller (quote when taking asks,
    /// base when taking bids). An empty opposing side yields an empty
    /// [`MarketFill`].
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for zero lots or a zero quote budget when taking
    /// asks, `SelfMatch` if the walk would reach the taker's own order.
    ///
    /// # Panics
    ///
    /// If routing fails after the plan pass. With a [`Ledger`] that only
    /// happens when the taker's collateral was not reserved as required
    /// above; its supply cap rules out credit overflow.
    ///
    /// [`Ledger`]: crate::collateral::Ledger
    pub fn fill_market_order<C: Collateral + ?Sized>(
        &mut self,
        _cap: &BookCap,
        collateral: &mut C,
        taker: AccountId,
        side_to_take: Side,
        max_base_lots: u64,
        max_quote: u64,
    ) -> BookResult<MarketFill> {
        if max_base_lots == 0 || (side_to_take == Side::Ask && max_quote == 0) {
            return Err(BookError::InvalidQuantity);
        }

        self.plan_market_order(taker, side_to_take, max_base_lots, max_quote)?;

        let direction = best_first(side_to_take);
        let mut summary = MarketFill::empty(side_to_take);
        let mut lots_left = max_base_lots;
        let mut quote_left = max_quote;

        let mut cursor = self.tree(side_to_take).traverse_init(direction).ok();
        while let Some(current) = cursor {
            let maker_order_id = current.key();
            let price = order_id::price(maker_order_id);
            let resting = self.tree(side_to_take).value(&current).clone();

            let lots = fill_size(side_to_take, price, resting.base_lots, lots_left, quote_left);
            if lots == 0 {
                break;
            }

            let complete = lots == resting.base_lots;
            let fill = self.make_fill(maker_order_id, resting.owner, taker, lots, complete);
            if let Err(err) = settle(collateral, side_to_take, &fill) {
                panic!("settlement failed for taker {taker} after planning: {err}");
            }

            let tree = self.tree_mut(side_to_take);
            cursor = if complete {
                tree.traverse_pop(current, direction).1
            } else {
                tree.value_mut(&current).fill(lots);
                None
            };

            trace!(
                maker_order_id = %format_args!("{maker_order_id:#x}"),
                maker = fill.maker,
                price,
                base_lots = lots,
                complete,
                "market fill"
            );

            lots_left -= lots;
            if side_to_take == Side::Ask {
                quote_left -= fill.quote;
            }
            summary.push(fill);
        }

        self.refresh_extremum(side_to_take);

        debug!(
            taker,
            side_taken = ?side_to_take,
            base_lots = summary.base_lots,
            quote = summary.quote,
            fills = summary.fills.len(),
            "filled market order"
        );
        Ok(summary)
    }

    /// Read-only walk mirroring the fill loop, checking for self-match
    fn plan_market_order(
        &self,
        taker: AccountId,
        side: Side,
        max_base_lots: u64,
        max_quote: u64,
    ) -> BookResult<()> {
        let tree = self.tree(side);
        let direction = best_first(side);
        let mut lots_left = max_base_lots;
        let mut quote_left = max_quote;

        let mut cursor = tree.traverse_init(direction).ok();
        while let Some(current) = cursor {
            let price = order_id::price(current.key());
            let resting = tree.value(&current);

            let lots = fill_size(side, price, resting.base_lots, lots_left, quote_left);
            if lots == 0 {
                break;
            }
            if resting.owner == taker {
                warn!(
                    taker,
                    order_id = %format_args!("{:#x}", current.key()),
                    "self-match rejected"
                );
                return Err(BookError::SelfMatch);
            }
            if lots < resting.base_lots {
                break;
            }

            lots_left -= lots;
            if side == Side::Ask {
                quote_left -= lots * price;
            }
            cursor = tree.traverse_next(&current, direction);
        }
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
