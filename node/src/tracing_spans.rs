//! Pre-built [`tracing::Span`] constructors for the ingestion hot paths.
//!
//! Using the same span names and field sets everywhere makes it easy to
//! filter and correlate traces from the processor loop and header sync.

use strata_types::{BlockHash, TxHash};
use tracing::{debug_span, info_span, Span};

/// Span covering the persistence of one full block.
pub fn block_persist_span(index: u32, hash: &BlockHash) -> Span {
    info_span!("block_persist", index, hash = %hash)
}

/// Span covering the application of a single transaction.
pub fn transaction_process_span(hash: &TxHash, kind: &'static str) -> Span {
    debug_span!("transaction_process", hash = %hash, kind)
}

/// Span covering one batch handed to the header persister.
pub fn header_persist_span(count: usize) -> Span {
    info_span!("header_persist", count)
}
