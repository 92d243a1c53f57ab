//! Transaction storage trait.

use crate::StoreError;
use strata_types::{Transaction, TxHash};

/// Trait for storing applied transactions, keyed by hash.
pub trait TransactionStore {
    fn put_transaction(&self, hash: &TxHash, tx: &Transaction) -> Result<(), StoreError>;

    fn get_transaction(&self, hash: &TxHash) -> Result<Option<Transaction>, StoreError>;
}
