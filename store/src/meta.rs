//! Chain height counters.

use crate::StoreError;

/// Trait for the running height counters kept next to the chain data.
///
/// `None` means nothing has been committed yet, which is distinct from a
/// height of zero (only genesis committed).
pub trait MetaStore {
    /// Height of the last fully persisted block.
    fn get_total_block_height(&self) -> Result<Option<u32>, StoreError>;

    fn set_total_block_height(&self, height: u32) -> Result<(), StoreError>;

    /// Height of the last persisted header (may run ahead of block height).
    fn get_total_block_header_height(&self) -> Result<Option<u32>, StoreError>;

    fn set_total_block_header_height(&self, height: u32) -> Result<(), StoreError>;
}
