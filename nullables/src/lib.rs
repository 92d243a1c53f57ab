//! Nullable infrastructure for deterministic testing.
//!
//! All external collaborators of the ingestion pipeline (ledger storage,
//! account balances, the mempool, the polling delay) are abstracted behind
//! traits. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem, network or wall clock
//!
//! Usage: swap real implementations for nullables in tests.

pub mod delay;
pub mod mempool;
pub mod store;

pub use delay::NullDelay;
pub use mempool::NullMempool;
pub use store::NullStore;
