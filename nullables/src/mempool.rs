//! Nullable mempool: a plain set of pending transaction hashes.

use std::collections::HashSet;
use std::sync::Mutex;

use strata_store::Mempool;
use strata_types::TxHash;

/// A test mempool that only tracks which hashes are pending.
#[derive(Default)]
pub struct NullMempool {
    pending: Mutex<HashSet<TxHash>>,
    removed: Mutex<Vec<TxHash>>,
}

impl NullMempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pending transaction.
    pub fn insert(&self, hash: TxHash) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(hash);
        }
    }

    pub fn contains(&self, hash: &TxHash) -> bool {
        self.pending
            .lock()
            .map(|p| p.contains(hash))
            .unwrap_or(false)
    }

    /// Every hash passed to `remove`, in call order (for assertions).
    pub fn removed(&self) -> Vec<TxHash> {
        self.removed.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Mempool for NullMempool {
    fn remove(&self, hash: &TxHash) -> bool {
        if let Ok(mut removed) = self.removed.lock() {
            removed.push(*hash);
        }
        self.pending
            .lock()
            .map(|mut p| p.remove(hash))
            .unwrap_or(false)
    }

    fn len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or_default()
    }
}
