//! Thread-safe handle to a [`Stabilizer`].
//!
//! Calls are serialized by a `parking_lot::RwLock`: one writer at a time,
//! readers in parallel between writes. A reader never sees a half-applied
//! call because every write completes or rolls back under the lock.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tidal_core::error::StabilizerError;
use tidal_core::ledger::MemoryLedger;
use tidal_core::traits::FungibleLedger;
use tidal_core::types::Address;

use crate::receipts::{DropReceipt, EngineSnapshot, RebaseOutcome, TransferReceipt};
use crate::stabilizer::Stabilizer;

/// Cloneable, shared engine handle.
pub struct SharedStabilizer<L: FungibleLedger = MemoryLedger> {
    inner: Arc<RwLock<Stabilizer<L>>>,
}

impl<L: FungibleLedger> Clone for SharedStabilizer<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: FungibleLedger> SharedStabilizer<L> {
    pub fn new(stabilizer: Stabilizer<L>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(stabilizer)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Stabilizer<L>> {
        self.inner.read()
    }

    /// Exclusive access for a sequence of calls that must not interleave.
    pub fn write(&self) -> RwLockWriteGuard<'_, Stabilizer<L>> {
        self.inner.write()
    }

    pub fn rebase(&self, now: u64) -> Result<RebaseOutcome, StabilizerError> {
        self.inner.write().rebase(now)
    }

    pub fn mint(&self, caller: &Address, now: u64) -> Result<DropReceipt, StabilizerError> {
        self.inner.write().mint(caller, now)
    }

    pub fn transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: u128,
        now: u64,
    ) -> Result<TransferReceipt, StabilizerError> {
        self.inner.write().transfer(from, to, amount, now)
    }

    pub fn burn(&self, account: &Address, amount: u128, now: u64) -> Result<u128, StabilizerError> {
        self.inner.write().burn(account, amount, now)
    }

    pub fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
        now: u64,
    ) -> Result<TransferReceipt, StabilizerError> {
        self.inner.write().transfer_from(spender, from, to, amount, now)
    }

    pub fn burn_from(
        &self,
        spender: &Address,
        account: &Address,
        amount: u128,
        now: u64,
    ) -> Result<u128, StabilizerError> {
        self.inner.write().burn_from(spender, account, amount, now)
    }

    pub fn approve(&self, owner: &Address, spender: &Address, amount: u128) {
        self.inner.write().approve(owner, spender, amount)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.inner.read().allowance(owner, spender)
    }

    pub fn balance_of(&self, account: &Address) -> u128 {
        self.inner.read().balance_of(account)
    }

    pub fn total_supply(&self) -> u128 {
        self.inner.read().total_supply()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.inner.read().snapshot()
    }
}
