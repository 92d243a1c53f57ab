//! Unified Ledger trait: one handle over every durable record the ingestion
//! pipeline reads or writes.

use strata_store::{
    AccountStore, AssetStore, BatchStore, BlockStore, CoinStateStore, ContractStore, MetaStore,
    StoreError, TransactionStore, ValidatorStore,
};
use strata_types::{BlockHash, HeaderKind, Transaction, TransactionOutput, TxHash};

use crate::LedgerError;

/// Unified ledger interface over all storage subsystems.
///
/// Any type implementing the individual stores is a `Ledger`; the blanket
/// impl below means backends never implement this trait by hand. Balances
/// live behind the same handle so one [`BatchStore::commit`] can move coins
/// and balances together.
pub trait Ledger:
    BlockStore
    + MetaStore
    + TransactionStore
    + CoinStateStore
    + AssetStore
    + ValidatorStore
    + ContractStore
    + AccountStore
    + BatchStore
    + Send
    + Sync
{
    /// Whether a block's full body has been committed (an `Extended` header
    /// exists for it). Header-only entries do not count.
    fn is_block_persisted(&self, hash: &BlockHash) -> Result<bool, StoreError> {
        Ok(self
            .get_block_header(hash)?
            .is_some_and(|h| h.kind == HeaderKind::Extended))
    }

    /// Load a prior transaction, failing if the ledger has never seen it.
    fn require_transaction(&self, hash: &TxHash) -> Result<Transaction, LedgerError> {
        self.get_transaction(hash)?
            .ok_or(LedgerError::UnknownTransaction(*hash))
    }

    /// Resolve the output referenced by `(hash, index)`.
    fn resolve_output(&self, hash: &TxHash, index: u16) -> Result<TransactionOutput, LedgerError> {
        let tx = self.require_transaction(hash)?;
        tx.outputs
            .get(index as usize)
            .cloned()
            .ok_or(LedgerError::OutputIndexOutOfRange { hash: *hash, index })
    }

    /// Summary of the recorded heights.
    fn summary(&self) -> Result<LedgerSummary, StoreError> {
        Ok(LedgerSummary {
            block_height: self.get_total_block_height()?,
            header_height: self.get_total_block_header_height()?,
        })
    }
}

impl<T> Ledger for T where
    T: BlockStore
        + MetaStore
        + TransactionStore
        + CoinStateStore
        + AssetStore
        + ValidatorStore
        + ContractStore
        + AccountStore
        + BatchStore
        + Send
        + Sync
{
}

/// Height summary of the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSummary {
    pub block_height: Option<u32>,
    pub header_height: Option<u32>,
}
