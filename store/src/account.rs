//! Account balance trait.

use crate::StoreError;
use strata_types::{AssetId, Fixed8, ScriptHash};

/// Per-owner, per-asset balances maintained alongside the UTXO set.
pub trait AccountStore {
    /// Apply a signed delta to the balance of `asset` held by `owner`.
    fn update_balance(
        &self,
        owner: &ScriptHash,
        asset: &AssetId,
        delta: Fixed8,
    ) -> Result<(), StoreError>;

    /// Current balance; zero for owners that never held the asset.
    fn get_balance(&self, owner: &ScriptHash, asset: &AssetId) -> Result<Fixed8, StoreError>;
}
