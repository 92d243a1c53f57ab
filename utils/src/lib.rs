//! Shared utilities for the Strata ledger.

pub mod logging;
pub mod time;

pub use logging::init_tracing;
pub use time::{Delay, DelayFuture, TokioDelay};
