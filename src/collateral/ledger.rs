//! In-memory per-account balances.

use std::collections::BTreeMap;

use crate::collateral::{Collateral, CoinType};
use crate::error::CollateralError;
use crate::types::AccountId;

/// Balance of one coin for one account.
///
/// Invariant: `available <= total`. The difference is locked behind
/// resting orders or in-flight market orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Balance {
    pub total: u64,
    pub available: u64,
}

impl Balance {
    /// Amount locked as collateral
    #[inline]
    pub fn locked(&self) -> u64 {
        self.total - self.available
    }

    fn lock(&mut self, amount: u64) -> Option<()> {
        self.available = self.available.checked_sub(amount)?;
        Some(())
    }

    fn unlock(&mut self, amount: u64) -> Option<()> {
        if amount > self.locked() {
            return None;
        }
        self.available += amount;
        Some(())
    }

    fn deduct_locked(&mut self, amount: u64) -> Option<()> {
        if amount > self.locked() {
            return None;
        }
        self.total -= amount;
        Some(())
    }

    fn credit(&mut self, amount: u64) -> Option<()> {
        self.total = self.total.checked_add(amount)?;
        self.available += amount;
        Some(())
    }
}

/// Base and quote balances of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Account {
    base: Balance,
    quote: Balance,
}

impl Account {
    fn balance_mut(&mut self, coin: CoinType) -> &mut Balance {
        match coin {
            CoinType::Base => &mut self.base,
            CoinType::Quote => &mut self.quote,
        }
    }

    fn balance(&self, coin: CoinType) -> Balance {
        match coin {
            CoinType::Base => self.base,
            CoinType::Quote => self.quote,
        }
    }
}

/// Ledger of registered accounts.
///
/// Accounts are kept in a `BTreeMap` so iteration order, and anything
/// hashed from it, is deterministic.
///
/// Deposits are capped so the total supply of each coin fits in a `u64`.
/// Every account total is bounded by that supply, so crediting a routed
/// amount never overflows.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    accounts: BTreeMap<AccountId, Account>,
    base_supply: u64,
    quote_supply: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an account with zero balances
    pub fn register(&mut self, account: AccountId) -> Result<(), CollateralError> {
        if self.is_registered(account) {
            return Err(CollateralError::AccountExists(account));
        }
        self.accounts.insert(account, Account::default());
        Ok(())
    }

    #[inline]
    pub fn is_registered(&self, account: AccountId) -> bool {
        self.accounts.contains_key(&account)
    }

    /// Number of registered accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Current balance of `coin` for `account`
    pub fn balance(&self, account: AccountId, coin: CoinType) -> Result<Balance, CollateralError> {
        self.accounts
            .get(&account)
            .map(|a| a.balance(coin))
            .ok_or(CollateralError::UnknownAccount(account))
    }

    /// Add `amount` to the account's total and available balance.
    ///
    /// Fails with `Overflow` if the coin's total supply would no longer
    /// fit in a `u64`.
    pub fn deposit(
        &mut self,
        account: AccountId,
        coin: CoinType,
        amount: u64,
    ) -> Result<(), CollateralError> {
        if !self.is_registered(account) {
            return Err(CollateralError::UnknownAccount(account));
        }
        let supply = self
            .supply(coin)
            .checked_add(amount)
            .ok_or(CollateralError::Overflow)?;

        self.balance_mut(account, coin)?
            .credit(amount)
            .ok_or(CollateralError::Overflow)?;
        *self.supply_mut(coin) = supply;
        Ok(())
    }

    /// Remove `amount` of available balance from the ledger
    pub fn withdraw(
        &mut self,
        account: AccountId,
        coin: CoinType,
        amount: u64,
    ) -> Result<(), CollateralError> {
        let balance = self.balance_mut(account, coin)?;
        if amount > balance.available {
            return Err(insufficient(account, coin, amount, balance.available));
        }
        balance.available -= amount;
        balance.total -= amount;
        *self.supply_mut(coin) -= amount;
        Ok(())
    }

    /// Sum of all totals for `coin`; conserved by every book operation
    pub fn total_supply(&self, coin: CoinType) -> u128 {
        self.accounts
            .values()
            .map(|a| u128::from(a.balance(coin).total))
            .sum()
    }

    fn supply(&self, coin: CoinType) -> u64 {
        match coin {
            CoinType::Base => self.base_supply,
            CoinType::Quote => self.quote_supply,
        }
    }

    fn supply_mut(&mut self, coin: CoinType) -> &mut u64 {
        match coin {
            CoinType::Base => &mut self.base_supply,
            CoinType::Quote => &mut self.quote_supply,
        }
    }

    fn balance_mut(
        &mut self,
        account: AccountId,
        coin: CoinType,
    ) -> Result<&mut Balance, CollateralError> {
        self.accounts
            .get_mut(&account)
            .map(|a| a.balance_mut(coin))
            .ok_or(CollateralError::UnknownAccount(account))
    }
}

fn insufficient(
    account: AccountId,
    coin: CoinType,
    required: u64,
    available: u64,
) -> CollateralError {
    CollateralError::InsufficientCollateral {
        account,
        coin,
        required,
        available,
    }
}

impl Collateral for Ledger {
    fn reserve(
        &mut self,
        account: AccountId,
        coin: CoinType,
        amount: u64,
    ) -> Result<(), CollateralError> {
        let balance = self.balance_mut(account, coin)?;
        let available = balance.available;
        balance
            .lock(amount)
            .ok_or_else(|| insufficient(account, coin, amount, available))
    }

    fn release(
        &mut self,
        account: AccountId,
        coin: CoinType,
        amount: u64,
    ) -> Result<(), CollateralError> {
        let balance = self.balance_mut(account, coin)?;
        let locked = balance.locked();
        balance
            .unlock(amount)
            .ok_or_else(|| insufficient(account, coin, amount, locked))
    }

    fn route(
        &mut self,
        from: AccountId,
        to: AccountId,
        coin: CoinType,
        amount: u64,
    ) -> Result<(), CollateralError> {
        // Check both sides before touching either
        let sender = self.balance(from, coin)?;
        let receiver = self.balance(to, coin)?;
        if amount > sender.locked() {
            return Err(insufficient(from, coin, amount, sender.locked()));
        }
        if from != to && receiver.total.checked_add(amount).is_none() {
            return Err(CollateralError::Overflow);
        }

        let sender = self.balance_mut(from, coin)?;
        sender.deduct_locked(amount).ok_or(CollateralError::Overflow)?;
        self.balance_mut(to, coin)?
            .credit(amount)
            .ok_or(CollateralError::Overflow)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
