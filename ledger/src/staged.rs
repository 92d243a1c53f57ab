//! Read-through staging of one transaction's writes.
//!
//! Processors read the ledger through [`StagedWrites`] and write into it.
//! Reads see the transaction's own earlier writes first (a Claim that also
//! spends from the same prior transaction merges both flags), and nothing
//! reaches the store until the finished batch is committed in one go.

use strata_store::WriteBatch;
use strata_types::{
    Asset, AssetId, CoinState, Contract, Fixed8, PublicKey, ScriptHash, Transaction,
    TransactionOutput, TxHash, Validator,
};

use crate::{Ledger, LedgerError};

pub struct StagedWrites<'a> {
    ledger: &'a dyn Ledger,
    batch: WriteBatch,
}

impl<'a> StagedWrites<'a> {
    pub fn new(ledger: &'a dyn Ledger) -> Self {
        Self {
            ledger,
            batch: WriteBatch::new(),
        }
    }

    pub fn require_transaction(&self, hash: &TxHash) -> Result<Transaction, LedgerError> {
        self.ledger.require_transaction(hash)
    }

    pub fn resolve_output(&self, hash: &TxHash, index: u16) -> Result<TransactionOutput, LedgerError> {
        self.ledger.resolve_output(hash, index)
    }

    pub fn coin_states(&self, hash: &TxHash) -> Result<Option<Vec<CoinState>>, LedgerError> {
        match self.batch.coin_states.get(hash) {
            Some(states) => Ok(Some(states.clone())),
            None => Ok(self.ledger.get_coin_states(hash)?),
        }
    }

    pub fn put_coin_states(&mut self, hash: TxHash, states: Vec<CoinState>) {
        self.batch.put_coin_states(hash, states);
    }

    pub fn asset(&self, id: &AssetId) -> Result<Option<Asset>, LedgerError> {
        match self.batch.assets.get(id) {
            Some(asset) => Ok(Some(asset.clone())),
            None => Ok(self.ledger.get_asset(id)?),
        }
    }

    pub fn put_asset(&mut self, asset: Asset) {
        self.batch.put_asset(asset);
    }

    pub fn validator(&self, key: &PublicKey) -> Result<Option<Validator>, LedgerError> {
        match self.batch.validators.get(key) {
            Some(validator) => Ok(Some(validator.clone())),
            None => Ok(self.ledger.get_validator(key)?),
        }
    }

    pub fn put_validator(&mut self, validator: Validator) {
        self.batch.put_validator(validator);
    }

    pub fn put_contract(&mut self, contract: Contract) {
        self.batch.put_contract(contract);
    }

    pub fn update_balance(
        &mut self,
        owner: ScriptHash,
        asset: AssetId,
        delta: Fixed8,
    ) -> Result<(), LedgerError> {
        Ok(self.batch.update_balance(owner, asset, delta)?)
    }

    pub(crate) fn into_batch(self) -> WriteBatch {
        self.batch
    }
}
