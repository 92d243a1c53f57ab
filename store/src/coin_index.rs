//! Derived coin index storage trait.

use crate::StoreError;
use strata_types::{CoinReference, ScriptHash};

/// Storage for the per-address spendable and claimable coin sets.
pub trait CoinIndexStore {
    /// Height of the last indexed block, `None` before genesis is indexed.
    fn get_index_height(&self) -> Result<Option<u32>, StoreError>;

    fn set_index_height(&self, height: u32) -> Result<(), StoreError>;

    fn get_spendable(&self, owner: &ScriptHash) -> Result<Vec<CoinReference>, StoreError>;

    fn put_spendable(&self, owner: &ScriptHash, coins: &[CoinReference])
        -> Result<(), StoreError>;

    fn get_claimable(&self, owner: &ScriptHash) -> Result<Vec<CoinReference>, StoreError>;

    fn put_claimable(&self, owner: &ScriptHash, coins: &[CoinReference])
        -> Result<(), StoreError>;
}
