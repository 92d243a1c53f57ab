//! Atomic multi-store writes.

use std::collections::BTreeMap;

use crate::StoreError;
use strata_types::{
    Asset, AssetId, CoinState, Contract, Fixed8, PublicKey, ScriptHash, Transaction, TxHash,
    Validator,
};

/// Every write produced by applying one transaction.
///
/// Built up in memory and handed to [`BatchStore::commit`], which must apply
/// all of it or none of it. The transaction record travels in the same batch,
/// so "the record exists" implies "its effects were applied".
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    pub coin_states: BTreeMap<TxHash, Vec<CoinState>>,
    /// Net signed delta per `(owner, asset)`.
    pub balance_deltas: BTreeMap<(ScriptHash, AssetId), Fixed8>,
    pub assets: BTreeMap<AssetId, Asset>,
    pub validators: BTreeMap<PublicKey, Validator>,
    pub contracts: BTreeMap<ScriptHash, Contract>,
    pub transactions: BTreeMap<TxHash, Transaction>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.coin_states.is_empty()
            && self.balance_deltas.is_empty()
            && self.assets.is_empty()
            && self.validators.is_empty()
            && self.contracts.is_empty()
            && self.transactions.is_empty()
    }

    pub fn put_coin_states(&mut self, hash: TxHash, states: Vec<CoinState>) {
        self.coin_states.insert(hash, states);
    }

    /// Add `delta` to the pending change of `owner`'s `asset` balance.
    pub fn update_balance(
        &mut self,
        owner: ScriptHash,
        asset: AssetId,
        delta: Fixed8,
    ) -> Result<(), StoreError> {
        let entry = self.balance_deltas.entry((owner, asset)).or_default();
        *entry = entry
            .checked_add(delta)
            .ok_or_else(|| StoreError::Backend(format!("balance delta overflow for {owner}")))?;
        Ok(())
    }

    pub fn put_asset(&mut self, asset: Asset) {
        self.assets.insert(asset.id, asset);
    }

    pub fn put_validator(&mut self, validator: Validator) {
        self.validators.insert(validator.public_key, validator);
    }

    pub fn put_contract(&mut self, contract: Contract) {
        self.contracts.insert(contract.script_hash(), contract);
    }

    pub fn put_transaction(&mut self, hash: TxHash, tx: Transaction) {
        self.transactions.insert(hash, tx);
    }
}

/// A backend that can commit a [`WriteBatch`] atomically.
pub trait BatchStore {
    /// Apply every write in `batch`, or none of them if an error is returned.
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}
