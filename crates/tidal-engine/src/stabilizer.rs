//! The stabilizer engine.
//!
//! [`Stabilizer`] composes the period clock, activity tracker, rate
//! calculator, burn applier and lazy settlement over a [`FungibleLedger`].
//! Every state-changing call runs against an undo journal and is all or
//! nothing: on error the ledger and engine books are restored exactly.
//!
//! There is no background timer. A rebase happens when someone calls
//! [`Stabilizer::rebase`], or at the start of any touching operation that
//! finds one overdue while `auto_rebase` is on.

use std::sync::Arc;

use tidal_core::constants::BPS_PRECISION;
use tidal_core::error::{ConfigError, StabilizerError};
use tidal_core::fixed::{Fixed, Rate};
use tidal_core::ledger::MemoryLedger;
use tidal_core::traits::{ActivitySample, FungibleLedger, RateCalculator};
use tidal_core::types::{AccountRecord, Address, GlobalState, PeriodStats, Phase};
use tidal_rate::{apply_premium, premium_bps, ActivityTracker, PeriodClock, RateEngine};
use tracing::{debug, info};

use crate::burn::BurnApplier;
use crate::config::StabilizerConfig;
use crate::journal::{Books, Journal};
use crate::receipts::{
    AccountSnapshot, DropReceipt, EngineSnapshot, RebaseOutcome, TransferReceipt,
};
use crate::settlement::{self, projected_balance};

/// Token stabilization engine over ledger `L`.
pub struct Stabilizer<L: FungibleLedger = MemoryLedger> {
    config: StabilizerConfig,
    clock: PeriodClock,
    tracker: ActivityTracker,
    rates: Arc<dyn RateCalculator>,
    burn: BurnApplier,
    books: Books,
    ledger: L,
}

impl Stabilizer<MemoryLedger> {
    /// Engine over a fresh in-memory ledger.
    pub fn with_memory_ledger(config: StabilizerConfig, origin: u64) -> Result<Self, ConfigError> {
        Self::new(config, origin, MemoryLedger::new())
    }
}

impl<L: FungibleLedger> Stabilizer<L> {
    /// Engine with genesis at `origin`, using the production [`RateEngine`].
    pub fn new(config: StabilizerConfig, origin: u64, ledger: L) -> Result<Self, ConfigError> {
        let rates = Arc::new(RateEngine::new(config.rate_params()));
        Self::with_calculator(config, origin, ledger, rates)
    }

    /// Engine with a caller-supplied rate calculator.
    pub fn with_calculator(
        config: StabilizerConfig,
        origin: u64,
        ledger: L,
        rates: Arc<dyn RateCalculator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let clock = PeriodClock::new(
            origin,
            config.period_length_secs,
            config.bootstrap_duration_periods,
        );
        info!(
            origin,
            period_length = config.period_length_secs,
            bootstrap_end = clock.bootstrap_end(),
            "stabilizer initialized"
        );
        Ok(Self {
            clock,
            tracker: ActivityTracker::new(config.moving_average_window),
            rates,
            burn: BurnApplier::new(config.burn_damping),
            books: Books::genesis(origin),
            ledger,
            config,
        })
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Close the open period if a full period has elapsed since the last
    /// rebase.
    ///
    /// # Errors
    ///
    /// [`StabilizerError::TooEarly`] if the period has not elapsed yet,
    /// [`StabilizerError::StaleTimestamp`] if `now` precedes the open period.
    pub fn rebase(&mut self, now: u64) -> Result<RebaseOutcome, StabilizerError> {
        self.atomically(|s, j| s.rebase_inner(now, j))
    }

    /// Bootstrap faucet: credit the premium-adjusted drop to `caller`.
    ///
    /// One claim per account per period; a claim stamped in a period before
    /// the account's last claim is a cooldown violation too.
    pub fn mint(&mut self, caller: &Address, now: u64) -> Result<DropReceipt, StabilizerError> {
        self.atomically(|s, j| {
            let period = s.begin_touch(now, j)?;
            if s.books.state.phase == Phase::Dynamic {
                return Err(StabilizerError::BootstrapEnded);
            }
            settlement::settle(&mut s.books, &mut s.ledger, j, caller, now)?;

            let last_drop = s.books.accounts.get(caller).and_then(|r| r.last_drop_period);
            if let Some(claimed) = last_drop.filter(|&p| p >= period) {
                return Err(StabilizerError::DropCooldown {
                    next_claim: s.clock.period_start(claimed.saturating_add(1)),
                });
            }

            let premium = premium_bps(s.clock.days_since_bootstrap(now));
            let amount = apply_premium(s.config.drop_amount(), premium);
            j.credit(&mut s.ledger, caller, amount)?;

            let balance = s.ledger.raw_balance_of(caller);
            if let Some(record) = s.books.account_mut(j, caller) {
                record.last_drop_period = Some(period);
                record.effective_balance = balance;
            }
            info!(account = %caller, amount, premium_bps = premium, period, "faucet drop");
            Ok(DropReceipt {
                account: *caller,
                amount,
                premium_bps: premium,
                period,
            })
        })
    }

    /// Move `amount` from `from` to `to`, burning the transfer commission
    /// when the current rate is a burn.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u128,
        now: u64,
    ) -> Result<TransferReceipt, StabilizerError> {
        if amount == 0 {
            return Err(StabilizerError::InvalidAmount);
        }
        self.atomically(|s, j| {
            s.begin_touch(now, j)?;
            s.transfer_inner(from, to, amount, now, j)
        })
    }

    /// [`transfer`](Self::transfer) on behalf of `from`, consuming
    /// `spender`'s allowance.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
        now: u64,
    ) -> Result<TransferReceipt, StabilizerError> {
        if amount == 0 {
            return Err(StabilizerError::InvalidAmount);
        }
        self.atomically(|s, j| {
            s.begin_touch(now, j)?;
            s.spend_allowance(from, spender, amount, j)?;
            s.transfer_inner(from, to, amount, now, j)
        })
    }

    /// Destroy `amount` of `account`'s balance. Returns the remaining balance.
    pub fn burn(
        &mut self,
        account: &Address,
        amount: u128,
        now: u64,
    ) -> Result<u128, StabilizerError> {
        if amount == 0 {
            return Err(StabilizerError::InvalidAmount);
        }
        self.atomically(|s, j| {
            s.begin_touch(now, j)?;
            s.burn_inner(account, amount, now, j)
        })
    }

    /// [`burn`](Self::burn) on behalf of `account`, consuming `spender`'s
    /// allowance.
    pub fn burn_from(
        &mut self,
        spender: &Address,
        account: &Address,
        amount: u128,
        now: u64,
    ) -> Result<u128, StabilizerError> {
        if amount == 0 {
            return Err(StabilizerError::InvalidAmount);
        }
        self.atomically(|s, j| {
            s.begin_touch(now, j)?;
            s.spend_allowance(account, spender, amount, j)?;
            s.burn_inner(account, amount, now, j)
        })
    }

    /// Let `spender` move up to `amount` of `owner`'s balance. Zero revokes.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) {
        // Cannot fail, so the journal is dropped unused.
        let mut journal = Journal::begin(&self.books);
        self.books
            .set_allowance(&mut journal, *owner, *spender, amount);
        debug!(%owner, %spender, amount, "approve");
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Projected balance: raw balance plus mint owed but not yet applied.
    pub fn balance_of(&self, account: &Address) -> u128 {
        projected_balance(
            self.books.accounts.get(account),
            self.ledger.raw_balance_of(account),
            self.books.state.accumulated_mint_rate,
        )
    }

    /// Raw, already-settled ledger balance.
    pub fn effective_balance_of(&self, account: &Address) -> u128 {
        self.ledger.raw_balance_of(account)
    }

    pub fn current_period(&self, now: u64) -> Result<u64, StabilizerError> {
        self.clock.current_period(now)
    }

    /// Rate computed at the last rebase.
    pub fn current_dynamic_rate(&self) -> Rate {
        self.books.state.current_rate
    }

    /// Cumulative mint rate accrued since genesis.
    pub fn accumulated_mint_rate(&self) -> Rate {
        self.books.state.accumulated_mint_rate
    }

    pub fn moving_average_tx_count(&self) -> Fixed {
        self.books.state.moving_average_tx_count
    }

    pub fn current_period_tx_count(&self) -> u64 {
        self.books.state.current_period_tx_count
    }

    pub fn next_rebase_timestamp(&self) -> u64 {
        self.clock
            .next_rebase_timestamp(self.books.state.last_rebase_time)
    }

    pub fn phase(&self) -> Phase {
        self.books.state.phase
    }

    /// Statistics of a closed period.
    pub fn period_stats(&self, period: u64) -> Option<&PeriodStats> {
        self.books.periods.get(&period)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.books.allowance(owner, spender)
    }

    /// Faucet premium in basis points at `now`. No premium once dynamic.
    pub fn premium(&self, now: u64) -> u64 {
        match self.books.state.phase {
            Phase::Bootstrap => premium_bps(self.clock.days_since_bootstrap(now)),
            Phase::Dynamic => BPS_PRECISION,
        }
    }

    pub fn account(&self, account: &Address) -> Option<&AccountRecord> {
        self.books.accounts.get(account)
    }

    pub fn total_supply(&self) -> u128 {
        self.ledger.total_supply()
    }

    pub fn global(&self) -> &GlobalState {
        &self.books.state
    }

    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    pub fn clock(&self) -> &PeriodClock {
        &self.clock
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Export global state, accounts and closed periods.
    pub fn snapshot(&self) -> EngineSnapshot {
        let mut accounts: Vec<AccountSnapshot> = self
            .books
            .accounts
            .iter()
            .map(|(address, record)| {
                let raw_balance = self.ledger.raw_balance_of(address);
                AccountSnapshot {
                    address: address.to_string(),
                    record: *record,
                    raw_balance,
                    projected_balance: projected_balance(
                        Some(record),
                        raw_balance,
                        self.books.state.accumulated_mint_rate,
                    ),
                }
            })
            .collect();
        accounts.sort_by(|a, b| a.address.cmp(&b.address));

        EngineSnapshot {
            global: self.books.state.clone(),
            total_supply: self.ledger.total_supply(),
            accounts,
            periods: self.books.periods.values().copied().collect(),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn atomically<T>(
        &mut self,
        op: impl FnOnce(&mut Self, &mut Journal) -> Result<T, StabilizerError>,
    ) -> Result<T, StabilizerError> {
        let mut journal = Journal::begin(&self.books);
        let result = op(self, &mut journal);
        if let Err(e) = &result {
            debug!(error = %e, "rolling back");
            journal.rollback(&mut self.books, &mut self.ledger);
        }
        result
    }

    /// Period index of `now`. Time may not run back into a period that
    /// has already been closed.
    fn check_timestamp(&self, now: u64) -> Result<u64, StabilizerError> {
        let period = self.clock.current_period(now)?;
        let open_period_start = self.books.state.last_rebase_time;
        if now < open_period_start {
            return Err(StabilizerError::StaleTimestamp { now, open_period_start });
        }
        Ok(period)
    }

    /// Validate `now`, run an overdue rebase and count the transaction.
    /// Returns the period `now` falls in.
    fn begin_touch(&mut self, now: u64, journal: &mut Journal) -> Result<u64, StabilizerError> {
        let period = self.check_timestamp(now)?;
        if self.config.auto_rebase
            && self
                .clock
                .is_rebase_due(self.books.state.last_rebase_time, now)
        {
            self.rebase_inner(now, journal)?;
        }
        self.tracker.record_transaction(&mut self.books.state);
        Ok(period)
    }

    fn rebase_inner(
        &mut self,
        now: u64,
        journal: &mut Journal,
    ) -> Result<RebaseOutcome, StabilizerError> {
        let current = self.check_timestamp(now)?;
        let last = self.books.state.last_rebase_time;
        if !self.clock.is_rebase_due(last, now) {
            return Err(StabilizerError::TooEarly {
                now,
                next_rebase: self.clock.next_rebase_timestamp(last),
            });
        }
        let closed_period = self.clock.current_period(last)?;

        let state = &mut self.books.state;
        let was_dynamic = state.phase == Phase::Dynamic;
        let tx_count = self.tracker.roll_over(state);

        // The average only tracks dynamic-phase activity.
        let rate = if was_dynamic {
            let average = self.tracker.absorb(state, tx_count);
            let sample = ActivitySample {
                tx_count,
                average: average.to_int(),
                total_supply: self.ledger.total_supply(),
            };
            let rate = self.rates.period_rate(&sample);
            debug!(
                tx_count,
                average = %average,
                swing_bound = ?self.rates.swing_bound(&sample),
                %rate,
                "period rate"
            );
            rate
        } else {
            Rate::ZERO
        };

        state.current_rate = rate;
        if rate.is_mint() {
            state.accumulated_mint_rate = state.accumulated_mint_rate.saturating_add(rate);
            state.last_rate_update_time = now;
        }

        let entered_dynamic = self.clock.should_enter_dynamic(state.phase, now);
        if entered_dynamic {
            state.phase = Phase::Dynamic;
            info!(now, period = current, "entering dynamic phase");
        }

        state.last_rebase_time = self.clock.period_start(current);
        let moving_average = state.moving_average_tx_count;
        let phase = state.phase;
        let next_rebase = self.clock.next_rebase_timestamp(state.last_rebase_time);

        self.books.close_period(
            journal,
            PeriodStats {
                period: closed_period,
                tx_count,
                rate,
                moving_average,
                closed_at: now,
            },
        );
        info!(
            period = closed_period,
            tx_count,
            %rate,
            %moving_average,
            %phase,
            next_rebase,
            "rebase"
        );

        Ok(RebaseOutcome {
            closed_period,
            tx_count,
            rate,
            moving_average,
            phase,
            entered_dynamic,
            next_rebase,
        })
    }

    fn spend_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: u128,
        journal: &mut Journal,
    ) -> Result<(), StabilizerError> {
        let have = self.books.allowance(owner, spender);
        if have < amount {
            return Err(StabilizerError::InsufficientAllowance { have, need: amount });
        }
        self.books
            .set_allowance(journal, *owner, *spender, have - amount);
        Ok(())
    }

    fn transfer_inner(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u128,
        now: u64,
        journal: &mut Journal,
    ) -> Result<TransferReceipt, StabilizerError> {
        settlement::settle(&mut self.books, &mut self.ledger, journal, from, now)?;
        settlement::settle(&mut self.books, &mut self.ledger, journal, to, now)?;

        let have = self.ledger.raw_balance_of(from);
        if have < amount {
            return Err(StabilizerError::InsufficientBalance { have, need: amount });
        }

        let burned = self.burn.burn_for(
            self.rates.as_ref(),
            self.books.state.phase,
            self.books.state.current_rate,
            amount,
        );
        let received = amount
            .checked_sub(burned)
            .ok_or(StabilizerError::ArithmeticOverflow)?;
        if burned > 0 {
            journal.debit(&mut self.ledger, from, burned)?;
        }
        if received > 0 {
            journal.transfer(&mut self.ledger, from, to, received)?;
        }
        settlement::sync_effective(&mut self.books, &self.ledger, journal, from);
        settlement::sync_effective(&mut self.books, &self.ledger, journal, to);

        debug!(%from, %to, amount, burned, received, "transfer");
        Ok(TransferReceipt {
            from: *from,
            to: *to,
            amount,
            burned,
            received,
        })
    }

    fn burn_inner(
        &mut self,
        account: &Address,
        amount: u128,
        now: u64,
        journal: &mut Journal,
    ) -> Result<u128, StabilizerError> {
        settlement::settle(&mut self.books, &mut self.ledger, journal, account, now)?;
        let have = self.ledger.raw_balance_of(account);
        if have < amount {
            return Err(StabilizerError::InsufficientBalance { have, need: amount });
        }
        journal.debit(&mut self.ledger, account, amount)?;
        settlement::sync_effective(&mut self.books, &self.ledger, journal, account);

        let remaining = self.ledger.raw_balance_of(account);
        debug!(%account, amount, remaining, "burn");
        Ok(remaining)
    }
}
