//! Engine books and the per-call undo journal.
//!
//! Every state-changing call runs against a [`Journal`] that remembers the
//! prior value of everything it touches: the global state, account records,
//! allowances, inserted period statistics and ledger operations. On error
//! the journal is replayed backwards so the call leaves no trace.

use std::collections::{BTreeMap, HashMap};

use tidal_core::error::LedgerError;
use tidal_core::traits::FungibleLedger;
use tidal_core::types::{AccountRecord, Address, GlobalState, PeriodStats};
use tracing::error;

/// Mutable engine bookkeeping that sits beside the ledger.
#[derive(Clone, Debug)]
pub(crate) struct Books {
    pub(crate) state: GlobalState,
    pub(crate) accounts: HashMap<Address, AccountRecord>,
    pub(crate) allowances: HashMap<(Address, Address), u128>,
    pub(crate) periods: BTreeMap<u64, PeriodStats>,
}

impl Books {
    pub(crate) fn genesis(origin: u64) -> Self {
        Self {
            state: GlobalState::genesis(origin),
            accounts: HashMap::new(),
            allowances: HashMap::new(),
            periods: BTreeMap::new(),
        }
    }

    /// Mutable access to an existing record, saving its prior value.
    pub(crate) fn account_mut(
        &mut self,
        journal: &mut Journal,
        account: &Address,
    ) -> Option<&mut AccountRecord> {
        journal.save_account(account, self.accounts.get(account).copied());
        self.accounts.get_mut(account)
    }

    pub(crate) fn insert_account(
        &mut self,
        journal: &mut Journal,
        account: Address,
        record: AccountRecord,
    ) {
        journal.save_account(&account, self.accounts.get(&account).copied());
        self.accounts.insert(account, record);
    }

    pub(crate) fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Set an allowance; zero removes the entry.
    pub(crate) fn set_allowance(
        &mut self,
        journal: &mut Journal,
        owner: Address,
        spender: Address,
        amount: u128,
    ) {
        let key = (owner, spender);
        journal.save_allowance(key, self.allowances.get(&key).copied());
        if amount == 0 {
            self.allowances.remove(&key);
        } else {
            self.allowances.insert(key, amount);
        }
    }

    /// Record a closed period. Closed periods are immutable: returns `false`
    /// and leaves the existing entry alone if the period is already closed.
    pub(crate) fn close_period(&mut self, journal: &mut Journal, stats: PeriodStats) -> bool {
        if self.periods.contains_key(&stats.period) {
            return false;
        }
        self.periods.insert(stats.period, stats);
        journal.closed_periods.push(stats.period);
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LedgerOp {
    Credit(Address, u128),
    Debit(Address, u128),
    Move(Address, Address, u128),
}

/// Undo log for one engine call.
#[derive(Debug)]
pub(crate) struct Journal {
    state: GlobalState,
    accounts: Vec<(Address, Option<AccountRecord>)>,
    allowances: Vec<((Address, Address), Option<u128>)>,
    closed_periods: Vec<u64>,
    ledger_ops: Vec<LedgerOp>,
}

impl Journal {
    /// Start a journal, capturing the global state as it stands.
    pub(crate) fn begin(books: &Books) -> Self {
        Self {
            state: books.state.clone(),
            accounts: Vec::new(),
            allowances: Vec::new(),
            closed_periods: Vec::new(),
            ledger_ops: Vec::new(),
        }
    }

    // Only the first save per key matters: it holds the pre-call value.
    fn save_account(&mut self, account: &Address, prior: Option<AccountRecord>) {
        if !self.accounts.iter().any(|(a, _)| a == account) {
            self.accounts.push((*account, prior));
        }
    }

    fn save_allowance(&mut self, key: (Address, Address), prior: Option<u128>) {
        if !self.allowances.iter().any(|(k, _)| *k == key) {
            self.allowances.push((key, prior));
        }
    }

    pub(crate) fn credit<L: FungibleLedger>(
        &mut self,
        ledger: &mut L,
        account: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        ledger.credit_supply(account, amount)?;
        self.ledger_ops.push(LedgerOp::Credit(*account, amount));
        Ok(())
    }

    pub(crate) fn debit<L: FungibleLedger>(
        &mut self,
        ledger: &mut L,
        account: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        ledger.debit_supply(account, amount)?;
        self.ledger_ops.push(LedgerOp::Debit(*account, amount));
        Ok(())
    }

    pub(crate) fn transfer<L: FungibleLedger>(
        &mut self,
        ledger: &mut L,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        ledger.move_balance(from, to, amount)?;
        self.ledger_ops.push(LedgerOp::Move(*from, *to, amount));
        Ok(())
    }

    /// Undo everything recorded, newest first.
    pub(crate) fn rollback<L: FungibleLedger>(self, books: &mut Books, ledger: &mut L) {
        for op in self.ledger_ops.into_iter().rev() {
            let undone = match op {
                LedgerOp::Credit(account, amount) => ledger.debit_supply(&account, amount),
                LedgerOp::Debit(account, amount) => ledger.credit_supply(&account, amount),
                LedgerOp::Move(from, to, amount) => ledger.move_balance(&to, &from, amount),
            };
            if let Err(e) = undone {
                error!(?op, error = %e, "ledger rollback failed");
            }
        }
        for period in self.closed_periods {
            books.periods.remove(&period);
        }
        for (key, prior) in self.allowances {
            match prior {
                Some(amount) => books.allowances.insert(key, amount),
                None => books.allowances.remove(&key),
            };
        }
        for (account, prior) in self.accounts {
            match prior {
                Some(record) => books.accounts.insert(account, record),
                None => books.accounts.remove(&account),
            };
        }
        books.state = self.state;
    }
}
