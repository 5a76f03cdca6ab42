//! Order book over two crit-bit trees.
//!
//! ## Architecture
//!
//! - **asks**: `CritBitTree<Order>`, best = minimum key
//! - **bids**: `CritBitTree<Order>`, best = maximum key
//! - **spread makers**: cached `min_ask` / `max_bid` keys, so the crossing
//!   check on placement is O(1)
//!
//! Keys are order ids (see [`order_id`]), so one tree walk visits orders
//! in price-time priority.
//!
//! ## Collateral
//!
//! The book calls into a [`Collateral`] implementation and never reads
//! balances itself:
//!
//! | Event | Ask | Bid |
//! |-------|-----|-----|
//! | place | reserve base `lots * scale_factor` | reserve quote `lots * price` |
//! | cancel | release the same for remaining lots | release the same for remaining lots |
//! | fill | maker routes base to taker | maker routes quote to taker |
//!
//! ## Example
//!
//! ```
//! use critbit_lob::collateral::{CoinType, Ledger};
//! use critbit_lob::orderbook::OrderBook;
//! use critbit_lob::types::{Side, NO_CUSTODIAN};
//!
//! let mut ledger = Ledger::new();
//! ledger.register(1).unwrap();
//! ledger.deposit(1, CoinType::Base, 1_000).unwrap();
//!
//! let mut book = OrderBook::new(10).unwrap();
//! book.place_limit_order(&mut ledger, 1, NO_CUSTODIAN, Side::Ask, 5, 90).unwrap();
//!
//! assert_eq!(book.best_ask_price(), Some(90));
//! assert_eq!(ledger.balance(1, CoinType::Base).unwrap().available, 950);
//! ```

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::collateral::{CoinType, Collateral};
use crate::config::BookConfig;
use crate::critbit::node::MAX_LEN;
use crate::critbit::CritBitTree;
use crate::error::{BookError, BookResult, CollateralError, ConfigError, TreeError};
use crate::types::order_id::{self, OrderId};
use crate::types::units::{lots_to_base, quote_for};
use crate::types::{AccountId, Fill, Order, Side};

/// `min_ask` while there are no asks
pub const MIN_ASK_DEFAULT: u128 = u128::MAX;

/// `max_bid` while there are no bids
pub const MAX_BID_DEFAULT: u128 = 0;

/// Capability for privileged book operations.
///
/// Only this crate can mint one; the [`Market`](crate::engine::Market)
/// facade holds it and passes it into
/// [`OrderBook::fill_market_order`], [`OrderBook::fill_order_internal`]
/// and [`OrderBook::remove_order_internal`].
#[derive(Debug)]
pub struct BookCap {
    _private: (),
}

impl BookCap {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// Limit order book for one market.
#[derive(Debug, Clone)]
pub struct OrderBook {
    /// Base subunits per lot
    scale_factor: u64,

    pub(super) asks: CritBitTree<Order>,

    pub(super) bids: CritBitTree<Order>,

    /// Key of the best ask, `MIN_ASK_DEFAULT` if none
    min_ask: u128,

    /// Key of the best bid, `MAX_BID_DEFAULT` if none
    max_bid: u128,

    /// Next sequence number to hand out
    counter: u64,
}

impl OrderBook {
    /// Create an empty book.
    ///
    /// # Errors
    ///
    /// `ZeroScaleFactor` if `scale_factor` is zero.
    pub fn new(scale_factor: u64) -> Result<Self, ConfigError> {
        Self::from_config(&BookConfig::default().with_scale_factor(scale_factor))
    }

    /// Create an empty book with tree storage pre-allocated.
    ///
    /// ```
    /// use critbit_lob::config::BookConfig;
    /// use critbit_lob::orderbook::OrderBook;
    ///
    /// let book = OrderBook::from_config(&BookConfig::default().with_capacity(1_000)).unwrap();
    /// assert!(book.is_empty());
    /// ```
    pub fn from_config(config: &BookConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            scale_factor: config.scale_factor,
            asks: CritBitTree::with_capacity(config.capacity),
            bids: CritBitTree::with_capacity(config.capacity),
            min_ask: MIN_ASK_DEFAULT,
            max_bid: MAX_BID_DEFAULT,
            counter: 0,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn scale_factor(&self) -> u64 {
        self.scale_factor
    }

    /// Tree holding one side of the book
    #[inline]
    pub fn tree(&self, side: Side) -> &CritBitTree<Order> {
        match side {
            Side::Ask => &self.asks,
            Side::Bid => &self.bids,
        }
    }

    #[inline]
    pub(super) fn tree_mut(&mut self, side: Side) -> &mut CritBitTree<Order> {
        match side {
            Side::Ask => &mut self.asks,
            Side::Bid => &mut self.bids,
        }
    }

    /// Key of the best ask, or `MIN_ASK_DEFAULT`
    #[inline]
    pub fn min_ask(&self) -> u128 {
        self.min_ask
    }

    /// Key of the best bid, or `MAX_BID_DEFAULT`
    #[inline]
    pub fn max_bid(&self) -> u128 {
        self.max_bid
    }

    /// Lowest ask price
    pub fn best_ask_price(&self) -> Option<u64> {
        (!self.asks.is_empty()).then(|| order_id::price(self.min_ask))
    }

    /// Highest bid price
    pub fn best_bid_price(&self) -> Option<u64> {
        (!self.bids.is_empty()).then(|| order_id::price(self.max_bid))
    }

    /// Best ask minus best bid, if both sides have orders
    pub fn spread(&self) -> Option<u64> {
        match (self.best_bid_price(), self.best_ask_price()) {
            (Some(bid), Some(ask)) => ask.checked_sub(bid),
            _ => None,
        }
    }

    #[inline]
    pub fn n_asks(&self) -> usize {
        self.asks.len()
    }

    #[inline]
    pub fn n_bids(&self) -> usize {
        self.bids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.asks.is_empty() && self.bids.is_empty()
    }

    /// Resting order under `order_id`
    pub fn order(&self, side: Side, order_id: OrderId) -> Option<&Order> {
        self.tree(side).borrow(order_id).ok()
    }

    /// Sequence number the next order will get
    #[inline]
    pub fn peek_sequence_id(&self) -> u64 {
        self.counter
    }

    /// Return the current sequence number and advance the counter
    #[inline]
    pub fn next_sequence_id(&mut self) -> u64 {
        let id = self.counter;
        self.counter += 1;
        id
    }

    /// Coin and amount locked behind `base_lots` of a `side` order
    pub fn collateral_for(
        &self,
        side: Side,
        base_lots: u64,
        price: u64,
    ) -> Option<(CoinType, u64)> {
        match side {
            Side::Ask => lots_to_base(base_lots, self.scale_factor).map(|a| (CoinType::Base, a)),
            Side::Bid => quote_for(base_lots, price).map(|a| (CoinType::Quote, a)),
        }
    }

    // ========================================================================
    // Limit Orders
    // ========================================================================

    /// Rest a limit order on the book.
    ///
    /// Checks run in this order, and nothing changes unless all pass:
    ///
    /// 1. `price > 0`, `base_lots > 0`, base and quote amounts fit in `u64`
    /// 2. the owner's collateral can be reserved
    /// 3. the order does not cross the spread (the reservation is released
    ///    again if it does)
    ///
    /// Only then is a sequence number drawn and the order inserted.
    ///
    /// # Errors
    ///
    /// `InvalidPrice`, `InvalidQuantity`, `Collateral` from the
    /// reservation, or `CrossedSpread`.
    pub fn place_limit_order<C: Collateral + ?Sized>(
        &mut self,
        collateral: &mut C,
        owner: AccountId,
        custodian_id: u64,
        side: Side,
        base_lots: u64,
        price: u64,
    ) -> BookResult<OrderId> {
        if price == 0 {
            return Err(BookError::InvalidPrice);
        }
        if base_lots == 0
            || lots_to_base(base_lots, self.scale_factor).is_none()
            || quote_for(base_lots, price).is_none()
        {
            return Err(BookError::InvalidQuantity);
        }

        if self.tree(side).len() as u64 >= MAX_LEN {
            return Err(TreeError::TreeFull.into());
        }

        let (coin, amount) = self
            .collateral_for(side, base_lots, price)
            .ok_or(BookError::InvalidQuantity)?;
        collateral.reserve(owner, coin, amount)?;

        if let Err(err) = self.check_spread(side, price) {
            collateral.release(owner, coin, amount)?;
            return Err(err);
        }

        let sequence = self.next_sequence_id();
        let id = order_id::order_id(price, sequence, side);
        self.tree_mut(side)
            .insert(id, Order::new(base_lots, owner, custodian_id))?;

        match side {
            Side::Ask if id < self.min_ask => self.min_ask = id,
            Side::Bid if id > self.max_bid => self.max_bid = id,
            _ => {}
        }

        debug!(
            order_id = %format_args!("{id:#x}"),
            ?side,
            price,
            base_lots,
            owner,
            "placed limit order"
        );
        Ok(id)
    }

    /// Reject a `side` order at `price` that would trade immediately
    fn check_spread(&self, side: Side, price: u64) -> BookResult<()> {
        let best = match side {
            Side::Ask => self.best_bid_price().filter(|&best| price <= best),
            Side::Bid => self.best_ask_price().filter(|&best| price >= best),
        };
        if let Some(best) = best {
            warn!(?side, price, best, "limit order crosses the spread");
            return Err(BookError::CrossedSpread { side, price, best });
        }
        Ok(())
    }

    /// Cancel a resting order on behalf of its owner or custodian.
    ///
    /// Releases the collateral still locked behind the remaining size.
    ///
    /// # Errors
    ///
    /// `OrderNotFound` if no order rests under `order_id` on `side`,
    /// `Unauthorized` if `owner` / `custodian_id` do not match it.
    pub fn cancel_limit_order<C: Collateral + ?Sized>(
        &mut self,
        collateral: &mut C,
        owner: AccountId,
        custodian_id: u64,
        side: Side,
        order_id: OrderId,
    ) -> BookResult<Order> {
        let order = self
            .tree(side)
            .borrow(order_id)
            .map_err(|_| BookError::OrderNotFound(order_id))?;
        if !order.is_managed_by(owner, custodian_id) {
            return Err(BookError::Unauthorized);
        }

        let order = self.remove_resting(collateral, side, order_id)?;
        debug!(
            order_id = %format_args!("{order_id:#x}"),
            ?side,
            owner,
            base_lots = order.base_lots,
            "cancelled limit order"
        );
        Ok(order)
    }

    /// Remove a resting order without an ownership check.
    ///
    /// Releases its collateral like a cancel.
    pub fn remove_order_internal<C: Collateral + ?Sized>(
        &mut self,
        _cap: &BookCap,
        collateral: &mut C,
        side: Side,
        order_id: OrderId,
    ) -> BookResult<Order> {
        if !self.tree(side).has_key(order_id) {
            return Err(BookError::OrderNotFound(order_id));
        }
        let order = self.remove_resting(collateral, side, order_id)?;
        debug!(
            order_id = %format_args!("{order_id:#x}"),
            ?side,
            owner = order.owner,
            "evicted limit order"
        );
        Ok(order)
    }

    /// Pop a resting order known to exist and release its collateral
    fn remove_resting<C: Collateral + ?Sized>(
        &mut self,
        collateral: &mut C,
        side: Side,
        order_id: OrderId,
    ) -> BookResult<Order> {
        let order = self.tree_mut(side).pop(order_id)?;

        let price = order_id::price(order_id);
        if let Some((coin, amount)) = self.collateral_for(side, order.base_lots, price) {
            if let Err(err) = collateral.release(order.owner, coin, amount) {
                panic!("collateral reserved for order {order_id:#x} is missing: {err}");
            }
        }

        if order_id == self.best_key(side) {
            self.refresh_extremum(side);
        }
        Ok(order)
    }

    // ========================================================================
    // Targeted Fills
    // ========================================================================

    /// Fill up to `base_lots` of one specific resting order.
    ///
    /// The caller must already have reserved the taker's side of the trade
    /// (quote when taking an ask, base when taking a bid). A shortfall
    /// there is reported as `Collateral` and leaves the book unchanged.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity`, `OrderNotFound`, `SelfMatch`, `Collateral`.
    pub fn fill_order_internal<C: Collateral + ?Sized>(
        &mut self,
        _cap: &BookCap,
        collateral: &mut C,
        taker: AccountId,
        side: Side,
        order_id: OrderId,
        base_lots: u64,
    ) -> BookResult<Fill> {
        if base_lots == 0 {
            return Err(BookError::InvalidQuantity);
        }
        let resting = self
            .tree(side)
            .borrow(order_id)
            .map_err(|_| BookError::OrderNotFound(order_id))?;
        if resting.owner == taker {
            warn!(taker, order_id = %format_args!("{order_id:#x}"), "self-match rejected");
            return Err(BookError::SelfMatch);
        }

        let maker = resting.owner;
        let lots = base_lots.min(resting.base_lots);
        let fill = self.make_fill(order_id, maker, taker, lots, lots == resting.base_lots);

        settle(collateral, side, &fill)?;

        if fill.maker_complete {
            self.tree_mut(side).pop(order_id)?;
            if order_id == self.best_key(side) {
                self.refresh_extremum(side);
            }
        } else {
            self.tree_mut(side).borrow_mut(order_id)?.fill(lots);
        }

        debug!(
            order_id = %format_args!("{order_id:#x}"),
            ?side,
            taker,
            base_lots = lots,
            "filled resting order"
        );
        Ok(fill)
    }

    /// Build the fill record for `lots` against a resting order.
    ///
    /// Amounts cannot overflow: both were checked for the full order size
    /// at placement.
    pub(super) fn make_fill(
        &self,
        maker_order_id: OrderId,
        maker: AccountId,
        taker: AccountId,
        lots: u64,
        maker_complete: bool,
    ) -> Fill {
        let price = order_id::price(maker_order_id);
        Fill {
            maker_order_id,
            maker,
            taker,
            base_lots: lots,
            base: lots * self.scale_factor,
            quote: lots * price,
            maker_complete,
        }
    }

    // ========================================================================
    // Spread Makers
    // ========================================================================

    /// Cached best key for `side`
    #[inline]
    pub(super) fn best_key(&self, side: Side) -> u128 {
        match side {
            Side::Ask => self.min_ask,
            Side::Bid => self.max_bid,
        }
    }

    /// Re-derive the cached best key for `side` from its tree
    pub(super) fn refresh_extremum(&mut self, side: Side) {
        match side {
            Side::Ask => self.min_ask = self.asks.min_key().unwrap_or(MIN_ASK_DEFAULT),
            Side::Bid => self.max_bid = self.bids.max_key().unwrap_or(MAX_BID_DEFAULT),
        }
    }

    // ========================================================================
    // State Root
    // ========================================================================

    /// SHA-256 over the whole book.
    ///
    /// Hashes the spread makers and the counter, then every resting order
    /// in key order (asks, then bids) as side tag, little-endian key and
    /// SSZ-encoded [`Order`]. Two books that went through the same calls
    /// hash identically.
    pub fn compute_state_root(&self) -> BookResult<[u8; 32]> {
        let mut hasher = Sha256::new();
        hasher.update(self.scale_factor.to_le_bytes());
        hasher.update(self.min_ask.to_le_bytes());
        hasher.update(self.max_bid.to_le_bytes());
        hasher.update(self.counter.to_le_bytes());

        for (tag, side) in [(0u8, Side::Ask), (1u8, Side::Bid)] {
            for (key, order) in self.tree(side) {
                let encoded =
                    ssz_rs::serialize(order).map_err(|e| BookError::Encoding(e.to_string()))?;
                hasher.update([tag]);
                hasher.update(key.to_le_bytes());
                hasher.update(&encoded);
            }
        }

        Ok(hasher.finalize().into())
    }

    /// State root as a hex string
    pub fn state_root_hex(&self) -> BookResult<String> {
        self.compute_state_root().map(hex::encode)
    }
}

/// Route both legs of one fill.
///
/// The taker's leg goes first: if it fails nothing has moved and the error
/// is returned. The maker's leg draws on collateral locked at placement,
/// so a failure there is a broken invariant and panics.
pub(super) fn settle<C: Collateral + ?Sized>(
    collateral: &mut C,
    side_taken: Side,
    fill: &Fill,
) -> Result<(), CollateralError> {
    let (taker_coin, taker_amount, maker_coin, maker_amount) = match side_taken {
        Side::Ask => (CoinType::Quote, fill.quote, CoinType::Base, fill.base),
        Side::Bid => (CoinType::Base, fill.base, CoinType::Quote, fill.quote),
    };

    collateral.route(fill.taker, fill.maker, taker_coin, taker_amount)?;
    if let Err(err) = collateral.route(fill.maker, fill.taker, maker_coin, maker_amount) {
        panic!(
            "maker {} collateral for order {:#x} is missing: {err}",
            fill.maker, fill.maker_order_id
        );
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================
