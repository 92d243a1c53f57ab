//! Nullable store: thread-safe in-memory storage for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use strata_store::{
    AccountStore, AssetStore, BatchStore, BlockStore, CoinIndexStore, CoinStateStore,
    ContractStore, MetaStore, StoreError, TransactionStore, ValidatorStore, WriteBatch,
};
use strata_types::{
    Asset, AssetId, BlockHash, BlockHeader, CoinReference, CoinState, Contract, Fixed8,
    HeaderKind, PublicKey, ScriptHash, Transaction, TxHash, Validator,
};

fn lock<'a, T>(m: &'a Mutex<T>, what: &'static str) -> Result<MutexGuard<'a, T>, StoreError> {
    m.lock().map_err(|_| StoreError::Poisoned(what))
}

#[derive(Default)]
struct Heights {
    block: Option<u32>,
    header: Option<u32>,
    index: Option<u32>,
}

/// An in-memory ledger, balance and coin-index store for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Default)]
pub struct NullStore {
    headers: Mutex<HashMap<BlockHash, BlockHeader>>,
    header_by_height: Mutex<HashMap<u32, BlockHash>>,
    transactions: Mutex<HashMap<TxHash, Transaction>>,
    coin_states: Mutex<HashMap<TxHash, Vec<CoinState>>>,
    assets: Mutex<HashMap<AssetId, Asset>>,
    validators: Mutex<HashMap<PublicKey, Validator>>,
    contracts: Mutex<HashMap<ScriptHash, Contract>>,
    balances: Mutex<HashMap<(ScriptHash, AssetId), Fixed8>>,
    spendable: Mutex<HashMap<ScriptHash, Vec<CoinReference>>>,
    claimable: Mutex<HashMap<ScriptHash, Vec<CoinReference>>>,
    heights: Mutex<Heights>,
    fail_transaction_writes: AtomicBool,
    commit_budget: Mutex<Option<usize>>,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put_transaction`, and every batch commit that
    /// carries a transaction record, fail with a backend error.
    pub fn set_fail_transaction_writes(&self, fail: bool) {
        self.fail_transaction_writes.store(fail, Ordering::SeqCst);
    }

    /// Let the next `commits` transaction-bearing batches through, then fail
    /// every later one until reset with `None`.
    pub fn set_commit_budget(&self, commits: Option<usize>) {
        *self
            .commit_budget
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = commits;
    }

    /// Number of stored headers (both kinds).
    pub fn header_count(&self) -> usize {
        self.headers.lock().map(|h| h.len()).unwrap_or_default()
    }

    /// Number of stored transactions.
    pub fn transaction_count(&self) -> usize {
        self.transactions.lock().map(|t| t.len()).unwrap_or_default()
    }
}

impl BlockStore for NullStore {
    fn put_block_header(&self, header: &BlockHeader) -> Result<(), StoreError> {
        let hash = header.hash();
        let mut headers = lock(&self.headers, "headers")?;
        // Never downgrade an extended header back to header-only.
        if let Some(existing) = headers.get(&hash) {
            if existing.kind == HeaderKind::Extended && header.kind == HeaderKind::Header {
                return Ok(());
            }
        }
        let mut stored = header.clone();
        stored.hash = Some(hash);
        headers.insert(hash, stored);
        lock(&self.header_by_height, "header_by_height")?.insert(header.index, hash);
        Ok(())
    }

    fn get_block_header(&self, hash: &BlockHash) -> Result<Option<BlockHeader>, StoreError> {
        Ok(lock(&self.headers, "headers")?.get(hash).cloned())
    }

    fn get_block_header_by_height(
        &self,
        height: u32,
    ) -> Result<Option<BlockHeader>, StoreError> {
        let hash = match lock(&self.header_by_height, "header_by_height")?.get(&height) {
            Some(hash) => *hash,
            None => return Ok(None),
        };
        self.get_block_header(&hash)
    }
}

impl MetaStore for NullStore {
    fn get_total_block_height(&self) -> Result<Option<u32>, StoreError> {
        Ok(lock(&self.heights, "heights")?.block)
    }

    fn set_total_block_height(&self, height: u32) -> Result<(), StoreError> {
        lock(&self.heights, "heights")?.block = Some(height);
        Ok(())
    }

    fn get_total_block_header_height(&self) -> Result<Option<u32>, StoreError> {
        Ok(lock(&self.heights, "heights")?.header)
    }

    fn set_total_block_header_height(&self, height: u32) -> Result<(), StoreError> {
        lock(&self.heights, "heights")?.header = Some(height);
        Ok(())
    }
}

impl TransactionStore for NullStore {
    fn put_transaction(&self, hash: &TxHash, tx: &Transaction) -> Result<(), StoreError> {
        if self.fail_transaction_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("transaction write rejected".into()));
        }
        lock(&self.transactions, "transactions")?.insert(*hash, tx.clone());
        Ok(())
    }

    fn get_transaction(&self, hash: &TxHash) -> Result<Option<Transaction>, StoreError> {
        Ok(lock(&self.transactions, "transactions")?.get(hash).cloned())
    }
}

impl CoinStateStore for NullStore {
    fn put_coin_states(&self, hash: &TxHash, states: &[CoinState]) -> Result<(), StoreError> {
        lock(&self.coin_states, "coin_states")?.insert(*hash, states.to_vec());
        Ok(())
    }

    fn get_coin_states(&self, hash: &TxHash) -> Result<Option<Vec<CoinState>>, StoreError> {
        Ok(lock(&self.coin_states, "coin_states")?.get(hash).cloned())
    }
}

impl AssetStore for NullStore {
    fn put_asset(&self, asset: &Asset) -> Result<(), StoreError> {
        lock(&self.assets, "assets")?.insert(asset.id, asset.clone());
        Ok(())
    }

    fn get_asset(&self, id: &AssetId) -> Result<Option<Asset>, StoreError> {
        Ok(lock(&self.assets, "assets")?.get(id).cloned())
    }
}

impl ValidatorStore for NullStore {
    fn put_validator(&self, validator: &Validator) -> Result<(), StoreError> {
        lock(&self.validators, "validators")?.insert(validator.public_key, validator.clone());
        Ok(())
    }

    fn get_validator(&self, public_key: &PublicKey) -> Result<Option<Validator>, StoreError> {
        Ok(lock(&self.validators, "validators")?.get(public_key).cloned())
    }
}

impl ContractStore for NullStore {
    fn put_contract(&self, contract: &Contract) -> Result<(), StoreError> {
        lock(&self.contracts, "contracts")?.insert(contract.script_hash(), contract.clone());
        Ok(())
    }

    fn get_contract(&self, script_hash: &ScriptHash) -> Result<Option<Contract>, StoreError> {
        Ok(lock(&self.contracts, "contracts")?.get(script_hash).cloned())
    }
}

impl AccountStore for NullStore {
    fn update_balance(
        &self,
        owner: &ScriptHash,
        asset: &AssetId,
        delta: Fixed8,
    ) -> Result<(), StoreError> {
        let mut balances = lock(&self.balances, "balances")?;
        let balance = balances.entry((*owner, *asset)).or_default();
        *balance = balance
            .checked_add(delta)
            .ok_or_else(|| StoreError::Backend(format!("balance overflow for {}", owner)))?;
        Ok(())
    }

    fn get_balance(&self, owner: &ScriptHash, asset: &AssetId) -> Result<Fixed8, StoreError> {
        Ok(lock(&self.balances, "balances")?
            .get(&(*owner, *asset))
            .copied()
            .unwrap_or_default())
    }
}

impl CoinIndexStore for NullStore {
    fn get_index_height(&self) -> Result<Option<u32>, StoreError> {
        Ok(lock(&self.heights, "heights")?.index)
    }

    fn set_index_height(&self, height: u32) -> Result<(), StoreError> {
        lock(&self.heights, "heights")?.index = Some(height);
        Ok(())
    }

    fn get_spendable(&self, owner: &ScriptHash) -> Result<Vec<CoinReference>, StoreError> {
        Ok(lock(&self.spendable, "spendable")?
            .get(owner)
            .cloned()
            .unwrap_or_default())
    }

    fn put_spendable(
        &self,
        owner: &ScriptHash,
        coins: &[CoinReference],
    ) -> Result<(), StoreError> {
        lock(&self.spendable, "spendable")?.insert(*owner, coins.to_vec());
        Ok(())
    }

    fn get_claimable(&self, owner: &ScriptHash) -> Result<Vec<CoinReference>, StoreError> {
        Ok(lock(&self.claimable, "claimable")?
            .get(owner)
            .cloned()
            .unwrap_or_default())
    }

    fn put_claimable(
        &self,
        owner: &ScriptHash,
        coins: &[CoinReference],
    ) -> Result<(), StoreError> {
        lock(&self.claimable, "claimable")?.insert(*owner, coins.to_vec());
        Ok(())
    }
}

impl BatchStore for NullStore {
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if !batch.transactions.is_empty() {
            if self.fail_transaction_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("transaction write rejected".into()));
            }
            if let Some(remaining) = lock(&self.commit_budget, "commit_budget")?.as_mut() {
                if *remaining == 0 {
                    return Err(StoreError::Backend("commit budget exhausted".into()));
                }
                *remaining -= 1;
            }
        }

        // Lock everything up front so no reader sees half a batch.
        let mut transactions = lock(&self.transactions, "transactions")?;
        let mut coin_states = lock(&self.coin_states, "coin_states")?;
        let mut assets = lock(&self.assets, "assets")?;
        let mut validators = lock(&self.validators, "validators")?;
        let mut contracts = lock(&self.contracts, "contracts")?;
        let mut balances = lock(&self.balances, "balances")?;

        let mut updated = Vec::with_capacity(batch.balance_deltas.len());
        for (key, delta) in &batch.balance_deltas {
            let current = balances.get(key).copied().unwrap_or_default();
            let next = current
                .checked_add(*delta)
                .ok_or_else(|| StoreError::Backend(format!("balance overflow for {}", key.0)))?;
            updated.push((*key, next));
        }

        balances.extend(updated);
        coin_states.extend(batch.coin_states);
        assets.extend(batch.assets);
        validators.extend(batch.validators);
        contracts.extend(batch.contracts);
        transactions.extend(batch.transactions);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_types::{Block, Timestamp};

    fn test_block(index: u32) -> Block {
        Block::new(index, BlockHash::new([index as u8; 32]), Timestamp::new(1000 + index), vec![])
    }

    #[test]
    fn header_lookup_by_hash_and_height() {
        let store = NullStore::new();
        let header = test_block(4).header();
        store.put_block_header(&header).unwrap();

        let by_hash = store.get_block_header(&header.hash()).unwrap().unwrap();
        let by_height = store.get_block_header_by_height(4).unwrap().unwrap();
        assert_eq!(by_hash, by_height);
        assert!(store.get_block_header_by_height(5).unwrap().is_none());
    }

    #[test]
    fn extended_header_is_not_downgraded() {
        let store = NullStore::new();
        let block = test_block(1);
        store.put_block_header(&block.extended_header()).unwrap();
        store.put_block_header(&block.header()).unwrap();

        let stored = store.get_block_header(&block.hash()).unwrap().unwrap();
        assert_eq!(stored.kind, HeaderKind::Extended);
    }

    #[test]
    fn heights_start_absent() {
        let store = NullStore::new();
        assert_eq!(store.get_total_block_height().unwrap(), None);
        assert_eq!(store.get_total_block_header_height().unwrap(), None);
        store.set_total_block_height(0).unwrap();
        assert_eq!(store.get_total_block_height().unwrap(), Some(0));
    }

    #[test]
    fn balances_accumulate_signed_deltas() {
        let store = NullStore::new();
        let owner = ScriptHash::new([1; 20]);
        let asset = TxHash::new([2; 32]);
        store.update_balance(&owner, &asset, Fixed8::from_raw(500)).unwrap();
        store.update_balance(&owner, &asset, Fixed8::from_raw(-200)).unwrap();
        assert_eq!(store.get_balance(&owner, &asset).unwrap(), Fixed8::from_raw(300));
    }

    #[test]
    fn failing_transaction_writes() {
        let store = NullStore::new();
        store.set_fail_transaction_writes(true);
        let tx = Transaction::new(strata_types::TransactionKind::Contract, vec![], vec![]);
        assert!(store.put_transaction(&tx.hash(), &tx).is_err());
        store.set_fail_transaction_writes(false);
        assert!(store.put_transaction(&tx.hash(), &tx).is_ok());
    }

    #[test]
    fn rejected_batch_leaves_nothing_behind() {
        let store = NullStore::new();
        let owner = ScriptHash::new([3; 20]);
        let asset = TxHash::new([4; 32]);
        let tx = Transaction::new(strata_types::TransactionKind::Contract, vec![], vec![]);

        let mut batch = WriteBatch::new();
        batch.update_balance(owner, asset, Fixed8::from_raw(10)).unwrap();
        batch.put_coin_states(tx.hash(), vec![CoinState::NEW]);
        batch.put_transaction(tx.hash(), tx.clone());

        store.set_fail_transaction_writes(true);
        assert!(store.commit(batch.clone()).is_err());
        assert!(store.get_balance(&owner, &asset).unwrap().is_zero());
        assert!(store.get_coin_states(&tx.hash()).unwrap().is_none());

        store.set_fail_transaction_writes(false);
        store.commit(batch).unwrap();
        assert_eq!(store.get_balance(&owner, &asset).unwrap(), Fixed8::from_raw(10));
        assert!(store.get_transaction(&tx.hash()).unwrap().is_some());
    }

    #[test]
    fn overflowing_batch_is_rejected_whole() {
        let store = NullStore::new();
        let owner = ScriptHash::new([5; 20]);
        let asset = TxHash::new([6; 32]);
        store.update_balance(&owner, &asset, Fixed8::from_raw(i64::MAX)).unwrap();

        let tx = Transaction::new(strata_types::TransactionKind::Contract, vec![], vec![]);
        let mut batch = WriteBatch::new();
        batch.update_balance(owner, asset, Fixed8::from_raw(1)).unwrap();
        batch.put_transaction(tx.hash(), tx.clone());

        assert!(store.commit(batch).is_err());
        assert!(store.get_transaction(&tx.hash()).unwrap().is_none());
    }

    #[test]
    fn commit_budget_fails_later_batches() {
        let store = NullStore::new();
        let batch = |nonce| {
            let tx = Transaction::new(strata_types::TransactionKind::Miner { nonce }, vec![], vec![]);
            let mut batch = WriteBatch::new();
            batch.put_transaction(tx.hash(), tx);
            batch
        };

        store.set_commit_budget(Some(1));
        store.commit(batch(1)).unwrap();
        assert!(store.commit(batch(2)).is_err());
        assert!(store.commit(batch(2)).is_err());
        assert_eq!(store.transaction_count(), 1);

        store.set_commit_budget(None);
        store.commit(batch(2)).unwrap();
        assert_eq!(store.transaction_count(), 2);
    }
}
