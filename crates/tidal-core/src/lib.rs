//! # tidal-core
//! Foundation types and traits for the Tidal stabilization engine.

pub mod constants;
pub mod error;
pub mod fixed;
pub mod ledger;
pub mod traits;
pub mod types;
