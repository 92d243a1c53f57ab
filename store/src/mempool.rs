//! Pending transaction pool trait.

use strata_types::TxHash;

/// The pool of transactions waiting to be included in a block.
///
/// Block persistence removes every transaction it applies so the pool never
/// re-offers one that is already on chain.
pub trait Mempool {
    /// Drop a transaction. Returns whether it was present.
    fn remove(&self, hash: &TxHash) -> bool;

    /// Number of pending transactions.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
