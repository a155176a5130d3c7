//! Lazy per-account settlement.
//!
//! Positive period rates accrue into a cumulative global accumulator. Each
//! account stores the accumulator value it has already absorbed (its
//! checkpoint). On every touch the account pulls `global - checkpoint` into
//! its owed rate and mints `effective_balance * owed` through the ledger.
//! Every account applies each increment to its own balance exactly once.

use tidal_core::error::StabilizerError;
use tidal_core::fixed::Rate;
use tidal_core::traits::FungibleLedger;
use tidal_core::types::{AccountRecord, Address};
use tracing::debug;

use crate::journal::{Books, Journal};

/// What a single settlement did to an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Settlement {
    /// The record was created by this touch.
    pub created: bool,
    /// Rate pulled from the global accumulator.
    pub pulled: Rate,
    /// Units minted to the account.
    pub minted: u128,
}

/// Sync, pull and apply for `account`.
pub(crate) fn settle<L: FungibleLedger>(
    books: &mut Books,
    ledger: &mut L,
    journal: &mut Journal,
    account: &Address,
    now: u64,
) -> Result<Settlement, StabilizerError> {
    let raw = ledger.raw_balance_of(account);
    let global = books.state.accumulated_mint_rate;

    let Some(record) = books.account_mut(journal, account) else {
        books.insert_account(journal, *account, AccountRecord::new(now, global, raw));
        debug!(%account, balance = raw, "account created");
        return Ok(Settlement {
            created: true,
            ..Settlement::default()
        });
    };

    record.effective_balance = raw;
    record.last_updated = now;

    // The checkpoint orders accruals exactly; timestamps alone cannot when a
    // rebase and a touch share a second.
    let pulled = global.saturating_delta(record.mint_rate_checkpoint);
    if !pulled.is_zero() {
        record.accumulated_mint_rate = record.accumulated_mint_rate.saturating_add(pulled);
        record.mint_rate_checkpoint = global;
        record.last_mint_rate_epoch = now;
    }

    let owed = record.accumulated_mint_rate;
    if owed.is_zero() {
        return Ok(Settlement {
            pulled,
            ..Settlement::default()
        });
    }

    let minted = owed.apply(record.effective_balance);
    record.accumulated_mint_rate = Rate::ZERO;
    if minted > 0 {
        journal.credit(ledger, account, minted)?;
    }
    let balance = ledger.raw_balance_of(account);
    if let Some(record) = books.accounts.get_mut(account) {
        record.effective_balance = balance;
    }

    debug!(%account, %owed, minted, balance, "settled");
    Ok(Settlement {
        created: false,
        pulled,
        minted,
    })
}

/// Refresh the stored effective balance after a ledger movement.
pub(crate) fn sync_effective<L: FungibleLedger>(
    books: &mut Books,
    ledger: &L,
    journal: &mut Journal,
    account: &Address,
) {
    let raw = ledger.raw_balance_of(account);
    if let Some(record) = books.account_mut(journal, account) {
        record.effective_balance = raw;
    }
}

/// Balance an account would hold if settled now, without mutating anything.
///
/// Unknown accounts have no owed rate, so their projection is the raw
/// ledger balance.
pub fn projected_balance(record: Option<&AccountRecord>, raw: u128, global: Rate) -> u128 {
    let Some(record) = record else {
        return raw;
    };
    let owed = record
        .accumulated_mint_rate
        .saturating_add(global.saturating_delta(record.mint_rate_checkpoint));
    raw.saturating_add(owed.apply(raw))
}
