//! # tidal-engine — Stabilizer engine over a fungible ledger.
//!
//! Composes the Tidal subsystems into one engine:
//! - [`stabilizer::Stabilizer`] — rebases, faucet, transfers, burns and queries
//! - [`settlement`] — lazy per-account pull and apply of accrued mint rate
//! - [`burn::BurnApplier`] — transfer commission under a negative rate
//! - [`shared::SharedStabilizer`] — lock-serialized handle for threads
//! - [`config::StabilizerConfig`] — engine configuration

pub mod burn;
pub mod config;
mod journal;
pub mod receipts;
pub mod settlement;
pub mod shared;
pub mod stabilizer;

pub use burn::BurnApplier;
pub use config::StabilizerConfig;
pub use receipts::{DropReceipt, EngineSnapshot, RebaseOutcome, TransferReceipt};
pub use settlement::projected_balance;
pub use shared::SharedStabilizer;
pub use stabilizer::Stabilizer;
