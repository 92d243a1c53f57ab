use strata_store::StoreError;
use strata_types::{AssetId, TxHash};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("unknown prior transaction {0}")]
    UnknownTransaction(TxHash),

    #[error("no coin states recorded for transaction {0}")]
    MissingCoinStates(TxHash),

    #[error("output {index} out of range for transaction {hash}")]
    OutputIndexOutOfRange { hash: TxHash, index: u16 },

    #[error("unknown asset {0}")]
    UnknownAsset(AssetId),

    #[error("amount overflow while applying {0}")]
    Overflow(&'static str),

    #[error("unsupported transaction kind: {0}")]
    UnsupportedTransactionKind(&'static str),

    /// The coin index's invalid-argument rejection: the block handed to
    /// `index_block` is not the one right after the last indexed block.
    #[error("unable to index: requires next block to be H+1 (expected {expected}, got {actual})")]
    IndexOutOfOrder { expected: u32, actual: u32 },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    /// Whether retrying the same operation later can succeed.
    ///
    /// Only backend I/O failures qualify. Everything else is a property of
    /// the data (an unknown prior transaction, an unsupported kind, a corrupt
    /// record) and fails the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(StoreError::Backend(_)))
    }
}
