//! Market facade: one order book, its ledger and its capability.
//!
//! ## Design Principles
//!
//! 1. **Atomic calls**: every entry point either applies fully or returns
//!    an error with nothing changed
//! 2. **Integer math**: lots, subunits and prices are all `u64`
//! 3. **Synchronous execution**: no interior locking; wrap the whole
//!    `Market` in one lock to share it between threads
//! 4. **Price-time priority**: best price first, then oldest order
//!
//! ## Market Orders
//!
//! - **Buys** take asks and are bounded by lots and a quote budget
//! - **Sells** take bids and are bounded by lots
//! - The taker's maximum spend is reserved up front and whatever was not
//!   spent is released afterwards
//! - Limit orders never match on placement; a crossing limit order is
//!   rejected with `CrossedSpread`
//!
//! ## Example
//!
//! ```
//! use critbit_lob::collateral::CoinType;
//! use critbit_lob::engine::Market;
//! use critbit_lob::types::{Side, NO_CUSTODIAN};
//!
//! let mut market = Market::new(10).unwrap();
//! for account in [1, 2] {
//!     market.register_account(account).unwrap();
//!     market.deposit(account, CoinType::Base, 1_000).unwrap();
//!     market.deposit(account, CoinType::Quote, 10_000).unwrap();
//! }
//!
//! // Resting sell: 5 lots at 90 quote per lot
//! market.place_limit_order(1, NO_CUSTODIAN, Side::Ask, 5, 90).unwrap();
//!
//! // Buy up to 5 lots, spending at most 1_000 quote
//! let result = market.submit_market_buy(2, 5, 1_000).unwrap();
//!
//! assert_eq!(result.base_lots, 5);
//! assert_eq!(result.quote, 450);
//! assert_eq!(market.balance(2, CoinType::Base).unwrap().available, 1_050);
//! ```

use tracing::debug;

use crate::collateral::{Balance, CoinType, Collateral, Ledger};
use crate::config::BookConfig;
use crate::error::{BookError, BookResult, ConfigError};
use crate::orderbook::{BookCap, OrderBook};
use crate::types::order_id::{self, OrderId};
use crate::types::units::lots_to_base;
use crate::types::{AccountId, Fill, MarketFill, Order, Side};

/// A single trading pair.
#[derive(Debug)]
pub struct Market {
    book: OrderBook,
    ledger: Ledger,
    cap: BookCap,
}

impl Market {
    /// Create a market whose lots hold `scale_factor` base subunits
    ///
    /// # Errors
    ///
    /// `ZeroScaleFactor` if `scale_factor` is zero.
    pub fn new(scale_factor: u64) -> Result<Self, ConfigError> {
        Self::from_config(&BookConfig::default().with_scale_factor(scale_factor))
    }

    pub fn from_config(config: &BookConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            book: OrderBook::from_config(config)?,
            ledger: Ledger::new(),
            cap: BookCap::new(),
        })
    }

    #[inline]
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    #[inline]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    pub fn register_account(&mut self, account: AccountId) -> BookResult<()> {
        self.ledger.register(account)?;
        debug!(account, "registered account");
        Ok(())
    }

    pub fn deposit(&mut self, account: AccountId, coin: CoinType, amount: u64) -> BookResult<()> {
        self.ledger.deposit(account, coin, amount)?;
        debug!(account, ?coin, amount, "deposit");
        Ok(())
    }

    /// Withdraw from the available balance; locked collateral stays
    pub fn withdraw(&mut self, account: AccountId, coin: CoinType, amount: u64) -> BookResult<()> {
        self.ledger.withdraw(account, coin, amount)?;
        debug!(account, ?coin, amount, "withdrawal");
        Ok(())
    }

    pub fn balance(&self, account: AccountId, coin: CoinType) -> BookResult<Balance> {
        Ok(self.ledger.balance(account, coin)?)
    }

    // ========================================================================
    // Limit Orders
    // ========================================================================

    /// See [`OrderBook::place_limit_order`]
    pub fn place_limit_order(
        &mut self,
        owner: AccountId,
        custodian_id: u64,
        side: Side,
        base_lots: u64,
        price: u64,
    ) -> BookResult<OrderId> {
        self.book
            .place_limit_order(&mut self.ledger, owner, custodian_id, side, base_lots, price)
    }

    /// See [`OrderBook::cancel_limit_order`]
    pub fn cancel_order(
        &mut self,
        owner: AccountId,
        custodian_id: u64,
        side: Side,
        order_id: OrderId,
    ) -> BookResult<Order> {
        self.book
            .cancel_limit_order(&mut self.ledger, owner, custodian_id, side, order_id)
    }

    /// Remove any resting order, releasing its owner's collateral
    pub fn evict_order(&mut self, side: Side, order_id: OrderId) -> BookResult<Order> {
        self.book
            .remove_order_internal(&self.cap, &mut self.ledger, side, order_id)
    }

    // ========================================================================
    // Market Orders
    // ========================================================================

    /// Buy up to `max_lots` lots from the asks, spending at most
    /// `max_quote` quote subunits.
    pub fn submit_market_buy(
        &mut self,
        taker: AccountId,
        max_lots: u64,
        max_quote: u64,
    ) -> BookResult<MarketFill> {
        if max_lots == 0 || max_quote == 0 {
            return Err(BookError::InvalidQuantity);
        }
        self.with_reserved(taker, CoinType::Quote, max_quote, |book, ledger, cap| {
            let fill = book.fill_market_order(cap, ledger, taker, Side::Ask, max_lots, max_quote)?;
            Ok((fill.quote, fill))
        })
    }

    /// Sell up to `max_lots` lots into the bids.
    pub fn submit_market_sell(
        &mut self,
        taker: AccountId,
        max_lots: u64,
    ) -> BookResult<MarketFill> {
        if max_lots == 0 {
            return Err(BookError::InvalidQuantity);
        }
        let max_base =
            lots_to_base(max_lots, self.book.scale_factor()).ok_or(BookError::InvalidQuantity)?;
        self.with_reserved(taker, CoinType::Base, max_base, |book, ledger, cap| {
            let fill = book.fill_market_order(cap, ledger, taker, Side::Bid, max_lots, 0)?;
            Ok((fill.base, fill))
        })
    }

    /// Take up to `base_lots` from one specific resting order
    pub fn fill_order(
        &mut self,
        taker: AccountId,
        side: Side,
        order_id: OrderId,
        base_lots: u64,
    ) -> BookResult<Fill> {
        let resting = self
            .book
            .order(side, order_id)
            .ok_or(BookError::OrderNotFound(order_id))?;
        let lots = base_lots.min(resting.base_lots);

        // Taker pays the opposite coin of the resting side
        let (coin, amount) = self
            .book
            .collateral_for(side.opposite(), lots, order_id::price(order_id))
            .ok_or(BookError::InvalidQuantity)?;

        self.with_reserved(taker, coin, amount, |book, ledger, cap| {
            let fill = book.fill_order_internal(cap, ledger, taker, side, order_id, base_lots)?;
            let spent = match coin {
                CoinType::Base => fill.base,
                CoinType::Quote => fill.quote,
            };
            Ok((spent, fill))
        })
    }

    /// Reserve `amount`, run `f`, then release whatever `f` reports as
    /// unspent. On error the whole reservation is released.
    fn with_reserved<T>(
        &mut self,
        account: AccountId,
        coin: CoinType,
        amount: u64,
        f: impl FnOnce(&mut OrderBook, &mut Ledger, &BookCap) -> BookResult<(u64, T)>,
    ) -> BookResult<T> {
        self.ledger.reserve(account, coin, amount)?;

        match f(&mut self.book, &mut self.ledger, &self.cap) {
            Ok((spent, value)) => {
                self.ledger.release(account, coin, amount - spent)?;
                Ok(value)
            }
            Err(err) => {
                self.ledger.release(account, coin, amount)?;
                Err(err)
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollateralError;
    use crate::types::NO_CUSTODIAN;

    const ALICE: AccountId = 1;
    const BOB: AccountId = 2;

    fn market() -> Market {
        let mut market = Market::new(10).unwrap();
        for account in [ALICE, BOB] {
            market.register_account(account).unwrap();
            market.deposit(account, CoinType::Base, 10_000).unwrap();
            market.deposit(account, CoinType::Quote, 100_000).unwrap();
        }
        market
    }

    #[test]
    fn test_register_twice() {
        let mut market = market();
        assert_eq!(
            market.register_account(ALICE),
            Err(BookError::Collateral(CollateralError::AccountExists(ALICE)))
        );
    }

    #[test]
    fn test_market_buy_releases_unspent_budget() {
        let mut market = market();
        market
            .place_limit_order(ALICE, NO_CUSTODIAN, Side::Ask, 5, 90)
            .unwrap();

        let result = market.submit_market_buy(BOB, 10, 50_000).unwrap();
        assert_eq!(result.base_lots, 5);
        assert_eq!(result.quote, 450);

        let quote = market.balance(BOB, CoinType::Quote).unwrap();
        assert_eq!(
            quote,
            Balance {
                total: 100_000 - 450,
                available: 100_000 - 450
            }
        );
        let base = market.balance(BOB, CoinType::Base).unwrap();
        assert_eq!(base.available, 10_000 + 50);

        let alice = market.balance(ALICE, CoinType::Quote).unwrap();
        assert_eq!(alice.available, 100_000 + 450);
        assert_eq!(market.ledger().total_supply(CoinType::Quote), 200_000);
    }

    #[test]
    fn test_market_sell_releases_unspent_base() {
        let mut market = market();
        market
            .place_limit_order(ALICE, NO_CUSTODIAN, Side::Bid, 3, 80)
            .unwrap();

        let result = market.submit_market_sell(BOB, 5).unwrap();
        assert_eq!(result.base_lots, 3);

        let base = market.balance(BOB, CoinType::Base).unwrap();
        assert_eq!(
            base,
            Balance {
                total: 10_000 - 30,
                available: 10_000 - 30
            }
        );
        assert_eq!(market.ledger().total_supply(CoinType::Base), 20_000);
    }

    #[test]
    fn test_market_order_budget_exceeds_balance() {
        let mut market = market();
        market
            .place_limit_order(ALICE, NO_CUSTODIAN, Side::Ask, 5, 90)
            .unwrap();

        assert!(matches!(
            market.submit_market_buy(BOB, 1, 100_001),
            Err(BookError::Collateral(CollateralError::InsufficientCollateral { .. }))
        ));
        assert_eq!(market.book().n_asks(), 1);
    }

    #[test]
    fn test_market_order_error_releases_reservation() {
        let mut market = market();
        market
            .place_limit_order(BOB, NO_CUSTODIAN, Side::Ask, 5, 90)
            .unwrap();

        assert_eq!(
            market.submit_market_buy(BOB, 5, 1_000),
            Err(BookError::SelfMatch)
        );
        let quote = market.balance(BOB, CoinType::Quote).unwrap();
        assert_eq!(quote.available, 100_000);
    }

    #[test]
    fn test_invalid_market_quantities() {
        let mut market = market();
        assert_eq!(market.submit_market_buy(BOB, 0, 10), Err(BookError::InvalidQuantity));
        assert_eq!(market.submit_market_buy(BOB, 10, 0), Err(BookError::InvalidQuantity));
        assert_eq!(market.submit_market_sell(BOB, 0), Err(BookError::InvalidQuantity));
    }

    #[test]
    fn test_fill_order_targets_one_order() {
        let mut market = market();
        let first = market
            .place_limit_order(ALICE, NO_CUSTODIAN, Side::Bid, 5, 80)
            .unwrap();
        let second = market
            .place_limit_order(ALICE, NO_CUSTODIAN, Side::Bid, 5, 70)
            .unwrap();

        // Skip the best bid and hit the second one
        let fill = market.fill_order(BOB, Side::Bid, second, 2).unwrap();
        assert_eq!((fill.base, fill.quote), (20, 140));
        assert_eq!(market.book().order(Side::Bid, second).unwrap().base_lots, 3);
        assert_eq!(market.book().max_bid(), first);

        let base = market.balance(BOB, CoinType::Base).unwrap();
        assert_eq!(
            base,
            Balance {
                total: 10_000 - 20,
                available: 10_000 - 20
            }
        );
    }

    #[test]
    fn test_evict_order() {
        let mut market = market();
        let id = market
            .place_limit_order(ALICE, NO_CUSTODIAN, Side::Ask, 5, 90)
            .unwrap();
        assert_eq!(
            market.balance(ALICE, CoinType::Base).unwrap().available,
            10_000 - 50
        );

        market.evict_order(Side::Ask, id).unwrap();
        assert!(market.book().is_empty());
        assert_eq!(market.balance(ALICE, CoinType::Base).unwrap().available, 10_000);
    }

    #[test]
    fn test_market_buy_near_supply_cap() {
        let mut market = Market::new(10).unwrap();
        market.register_account(ALICE).unwrap();
        market.register_account(BOB).unwrap();
        market.deposit(ALICE, CoinType::Base, 10).unwrap();
        market.deposit(ALICE, CoinType::Quote, u64::MAX - 10).unwrap();
        market
            .place_limit_order(ALICE, NO_CUSTODIAN, Side::Ask, 1, 100)
            .unwrap();

        // Funding that could overflow the maker on settlement is refused
        assert_eq!(
            market.deposit(BOB, CoinType::Quote, 1_000),
            Err(BookError::Collateral(CollateralError::Overflow))
        );
        assert!(matches!(
            market.submit_market_buy(BOB, 1, 1_000),
            Err(BookError::Collateral(CollateralError::InsufficientCollateral { .. }))
        ));
        assert_eq!(market.book().n_asks(), 1);

        // Within the cap the fill settles
        market.deposit(BOB, CoinType::Quote, 10).unwrap();
        market.withdraw(ALICE, CoinType::Quote, 1_000).unwrap();
        market.deposit(BOB, CoinType::Quote, 1_000).unwrap();
        let result = market.submit_market_buy(BOB, 1, 1_000).unwrap();
        assert_eq!(result.quote, 100);
        assert_eq!(
            market.balance(ALICE, CoinType::Quote).unwrap().total,
            u64::MAX - 10 - 1_000 + 100
        );
        assert!(market.book().is_empty());
    }

    #[test]
    fn test_new_rejects_zero_scale_factor() {
        assert_eq!(Market::new(0).err(), Some(ConfigError::ZeroScaleFactor));
    }

    #[test]
    fn test_withdraw_respects_locked() {
        let mut market = market();
        market
            .place_limit_order(ALICE, NO_CUSTODIAN, Side::Ask, 1_000, 90)
            .unwrap();
        assert!(market.withdraw(ALICE, CoinType::Base, 1).is_err());
        market.withdraw(ALICE, CoinType::Quote, 100_000).unwrap();
        assert_eq!(market.balance(ALICE, CoinType::Quote).unwrap().total, 0);
    }
}
