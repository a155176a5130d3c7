//! Adversarial and end-to-end test suite for the Tidal stabilizer.
//!
//! The integration tests in `tests/` drive a full engine through the
//! bootstrap and dynamic phases and try to break its accounting
//! invariants under randomized operation sequences.

pub mod helpers;
