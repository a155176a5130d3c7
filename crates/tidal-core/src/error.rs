//! Error types for the Tidal engine.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient funds: have {have}, need {need}")] InsufficientFunds { have: u128, need: u128 },
    #[error("supply overflow")] SupplyOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid length: {0}")] InvalidLength(usize),
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StabilizerError {
    #[error("rebase too early: now {now}, next rebase at {next_rebase}")] TooEarly { now: u64, next_rebase: u64 },
    #[error("insufficient balance: have {have}, need {need}")] InsufficientBalance { have: u128, need: u128 },
    #[error("insufficient allowance: have {have}, need {need}")] InsufficientAllowance { have: u128, need: u128 },
    #[error("invalid amount")] InvalidAmount,
    #[error("bootstrap phase has ended")] BootstrapEnded,
    #[error("drop already claimed this period, next claim at {next_claim}")] DropCooldown { next_claim: u64 },
    #[error("timestamp {now} precedes origin {origin}")] InvalidTimestamp { now: u64, origin: u64 },
    #[error("timestamp {now} precedes open period start {open_period_start}")] StaleTimestamp { now: u64, open_period_start: u64 },
    #[error("arithmetic overflow")] ArithmeticOverflow,
    #[error(transparent)] Ledger(#[from] LedgerError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid config: {0}")] Invalid(String),
    #[error("config load: {0}")] Load(String),
}
