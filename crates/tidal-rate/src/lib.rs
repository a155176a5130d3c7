//! # tidal-rate — Period clock and rate engine.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! - **Period clock**: maps timestamps to period indices and decides when a
//!   rebase is due and when the bootstrap phase ends.
//! - **Activity tracker**: per-period transaction counter plus an
//!   exponential moving average with window `N`.
//! - **Rate engine**: base mint/burn rates derived from annual rates, an
//!   activity swing capped at 3×, clamped by the cost of faking activity.
//! - **Premium**: early-participation multiplier `1 + 1/(days^2 + 2)`.

pub mod activity;
pub mod clock;
pub mod engine;
pub mod premium;

pub use activity::ActivityTracker;
pub use clock::PeriodClock;
pub use engine::{RateEngine, RateParams};
pub use premium::{apply_premium, premium_bps};
