//! In-memory fungible ledger.
//!
//! [`MemoryLedger`] implements [`FungibleLedger`] with a `HashMap` of raw
//! balances. It backs tests, benches and the simulator; an embedding system
//! supplies its own ledger in production.

use std::collections::HashMap;

use tracing::trace;

use crate::error::LedgerError;
use crate::traits::FungibleLedger;
use crate::types::Address;

/// In-memory balance ledger.
///
/// Zero balances are removed from the map so [`account_count`](Self::account_count)
/// reports holders only.
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger {
    balances: HashMap<Address, u128>,
    total_supply: u128,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts with a nonzero balance.
    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    /// Sum of all balances. Equals [`total_supply`](FungibleLedger::total_supply)
    /// unless the ledger is corrupted.
    pub fn sum_of_balances(&self) -> u128 {
        self.balances.values().fold(0u128, |acc, b| acc.saturating_add(*b))
    }

    fn set_balance(&mut self, account: &Address, balance: u128) {
        if balance == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(*account, balance);
        }
    }
}

impl FungibleLedger for MemoryLedger {
    fn credit_supply(&mut self, account: &Address, amount: u128) -> Result<(), LedgerError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow)?;
        let balance = self
            .raw_balance_of(account)
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow)?;
        self.total_supply = supply;
        self.set_balance(account, balance);
        trace!(target: "tidal::ledger", from = %Address::ZERO, to = %account, amount, "Transfer");
        Ok(())
    }

    fn debit_supply(&mut self, account: &Address, amount: u128) -> Result<(), LedgerError> {
        let have = self.raw_balance_of(account);
        if have < amount {
            return Err(LedgerError::InsufficientFunds { have, need: amount });
        }
        self.set_balance(account, have - amount);
        self.total_supply -= amount;
        trace!(target: "tidal::ledger", from = %account, to = %Address::ZERO, amount, "Transfer");
        Ok(())
    }

    fn move_balance(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), LedgerError> {
        let have = self.raw_balance_of(from);
        if have < amount {
            return Err(LedgerError::InsufficientFunds { have, need: amount });
        }
        if from != to {
            let credited = self
                .raw_balance_of(to)
                .checked_add(amount)
                .ok_or(LedgerError::SupplyOverflow)?;
            self.set_balance(from, have - amount);
            self.set_balance(to, credited);
        }
        trace!(target: "tidal::ledger", from = %from, to = %to, amount, "Transfer");
        Ok(())
    }

    fn raw_balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> u128 {
        self.total_supply
    }
}
