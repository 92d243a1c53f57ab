//! Block header storage trait.

use crate::StoreError;
use strata_types::{BlockHash, BlockHeader};

/// Trait for block header storage.
///
/// A header is stored under its hash and indexed by height. Persisting a full
/// block stores its [`HeaderKind::Extended`](strata_types::HeaderKind) header;
/// the bodies live in the [`TransactionStore`](crate::TransactionStore).
pub trait BlockStore {
    /// Store a header. Writing an `Extended` header over an existing `Header`
    /// for the same hash upgrades it. A `Header` written over an existing
    /// `Extended` entry must be ignored: a committed body is never downgraded.
    fn put_block_header(&self, header: &BlockHeader) -> Result<(), StoreError>;

    /// Retrieve a header by hash.
    fn get_block_header(&self, hash: &BlockHash) -> Result<Option<BlockHeader>, StoreError>;

    /// Retrieve the header committed at `height`.
    fn get_block_header_by_height(&self, height: u32)
        -> Result<Option<BlockHeader>, StoreError>;
}
