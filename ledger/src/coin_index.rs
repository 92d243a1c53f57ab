//! Coin index: per-address spendable and claimable coin sets.
//!
//! The index trails the ledger one block at a time. Indexing block `H + 1`
//! requires that block `H` was the last one indexed, so the derived sets are
//! always a pure function of the persisted chain prefix.
//!
//! - An output enters its owner's **spendable** set when gained and leaves it
//!   when spent.
//! - A spent output of the governing asset enters its owner's **claimable**
//!   set and leaves it when a Claim transaction references it.
//!
//! Both sets behave as sets, so indexing the same block twice (a retry after
//! the height write failed) leaves them unchanged.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use strata_store::CoinIndexStore;
use strata_types::{
    AssetId, Block, CoinReference, ScriptHash, Transaction, TransactionKind, TransactionOutput,
    TxHash,
};

use crate::{Ledger, LedgerError};

pub struct CoinIndex {
    ledger: Arc<dyn Ledger>,
    store: Arc<dyn CoinIndexStore + Send + Sync>,
    governing_asset: AssetId,
}

/// Address sets touched while indexing one block, written back together.
#[derive(Default)]
struct Pending {
    spendable: BTreeMap<ScriptHash, Vec<CoinReference>>,
    claimable: BTreeMap<ScriptHash, Vec<CoinReference>>,
}

impl CoinIndex {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        store: Arc<dyn CoinIndexStore + Send + Sync>,
        governing_asset: AssetId,
    ) -> Self {
        Self {
            ledger,
            store,
            governing_asset,
        }
    }

    /// Index of the last indexed block, `None` before genesis.
    pub fn get_height(&self) -> Result<Option<u32>, LedgerError> {
        Ok(self.store.get_index_height()?)
    }

    pub fn get_spendable(&self, address: &ScriptHash) -> Result<Vec<CoinReference>, LedgerError> {
        Ok(self.store.get_spendable(address)?)
    }

    pub fn get_claimable(&self, address: &ScriptHash) -> Result<Vec<CoinReference>, LedgerError> {
        Ok(self.store.get_claimable(address)?)
    }

    /// Fold `block` into the index. Fails unless it is the next block.
    pub fn index_block(&self, block: &Block) -> Result<(), LedgerError> {
        let expected = self.store.get_index_height()?.map_or(0, |h| h + 1);
        if block.index != expected {
            return Err(LedgerError::IndexOutOfOrder {
                expected,
                actual: block.index,
            });
        }

        let local: HashMap<TxHash, &Transaction> =
            block.transactions.iter().map(|tx| (tx.hash(), tx)).collect();
        let mut pending = Pending::default();

        for tx in &block.transactions {
            let hash = tx.hash();

            for input in &tx.inputs {
                let output = self.resolve(&local, input)?;
                self.spendable(&mut pending, &output.script_hash)?
                    .retain(|c| c != input);
                if output.asset_id == self.governing_asset {
                    insert(self.claimable(&mut pending, &output.script_hash)?, *input);
                }
            }

            if let TransactionKind::Claim { claims } = &tx.kind {
                for claim in claims {
                    let output = self.resolve(&local, claim)?;
                    self.claimable(&mut pending, &output.script_hash)?
                        .retain(|c| c != claim);
                }
            }

            for (index, output) in tx.outputs.iter().enumerate() {
                let index = u16::try_from(index).map_err(|_| LedgerError::OutputIndexOutOfRange {
                    hash,
                    index: u16::MAX,
                })?;
                let reference = CoinReference::new(hash, index);
                insert(self.spendable(&mut pending, &output.script_hash)?, reference);
            }
        }

        for (owner, coins) in &pending.spendable {
            self.store.put_spendable(owner, coins)?;
        }
        for (owner, coins) in &pending.claimable {
            self.store.put_claimable(owner, coins)?;
        }
        self.store.set_index_height(block.index)?;

        tracing::debug!(
            index = block.index,
            addresses = pending.spendable.len(),
            "block indexed"
        );
        Ok(())
    }

    fn resolve(
        &self,
        local: &HashMap<TxHash, &Transaction>,
        reference: &CoinReference,
    ) -> Result<TransactionOutput, LedgerError> {
        match local.get(&reference.prev_hash) {
            Some(tx) => tx
                .outputs
                .get(reference.prev_index as usize)
                .cloned()
                .ok_or(LedgerError::OutputIndexOutOfRange {
                    hash: reference.prev_hash,
                    index: reference.prev_index,
                }),
            None => self
                .ledger
                .resolve_output(&reference.prev_hash, reference.prev_index),
        }
    }

    fn spendable<'a>(
        &self,
        pending: &'a mut Pending,
        owner: &ScriptHash,
    ) -> Result<&'a mut Vec<CoinReference>, LedgerError> {
        if !pending.spendable.contains_key(owner) {
            let coins = self.store.get_spendable(owner)?;
            pending.spendable.insert(*owner, coins);
        }
        Ok(pending.spendable.entry(*owner).or_default())
    }

    fn claimable<'a>(
        &self,
        pending: &'a mut Pending,
        owner: &ScriptHash,
    ) -> Result<&'a mut Vec<CoinReference>, LedgerError> {
        if !pending.claimable.contains_key(owner) {
            let coins = self.store.get_claimable(owner)?;
            pending.claimable.insert(*owner, coins);
        }
        Ok(pending.claimable.entry(*owner).or_default())
    }
}

/// Set insert. Re-indexing a block over a partially written earlier attempt
/// then converges on the same sets.
fn insert(coins: &mut Vec<CoinReference>, coin: CoinReference) {
    if !coins.contains(&coin) {
        coins.push(coin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_nullables::NullStore;
    use strata_store::{CoinIndexStore, TransactionStore};
    use strata_types::{BlockHash, Fixed8, Timestamp};

    fn governing() -> AssetId {
        TxHash::new([0x60; 32])
    }

    fn utility() -> AssetId {
        TxHash::new([0x61; 32])
    }

    fn owner(n: u8) -> ScriptHash {
        ScriptHash::new([n; 20])
    }

    fn block(index: u32, transactions: Vec<Transaction>) -> Block {
        Block::new(index, BlockHash::ZERO, Timestamp::new(100 + index), transactions)
    }

    fn pay(inputs: Vec<CoinReference>, asset: AssetId, to: u8, value: i64) -> Transaction {
        Transaction::new(
            TransactionKind::Contract,
            inputs,
            vec![TransactionOutput::new(asset, Fixed8::from_raw(value), owner(to))],
        )
    }

    fn index(store: &Arc<NullStore>) -> CoinIndex {
        CoinIndex::new(store.clone(), store.clone(), governing())
    }

    #[test]
    fn first_block_must_be_genesis() {
        let store = Arc::new(NullStore::new());
        let err = index(&store).index_block(&block(1, vec![])).unwrap_err();
        assert!(matches!(err, LedgerError::IndexOutOfOrder { expected: 0, actual: 1 }));
        assert_eq!(index(&store).get_height().unwrap(), None);
    }

    #[test]
    fn gaps_and_repeats_are_rejected() {
        let store = Arc::new(NullStore::new());
        let idx = index(&store);
        idx.index_block(&block(0, vec![])).unwrap();
        idx.index_block(&block(1, vec![])).unwrap();

        assert!(matches!(
            idx.index_block(&block(1, vec![])),
            Err(LedgerError::IndexOutOfOrder { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            idx.index_block(&block(3, vec![])),
            Err(LedgerError::IndexOutOfOrder { expected: 2, actual: 3 })
        ));
        assert_eq!(idx.get_height().unwrap(), Some(1));
    }

    #[test]
    fn spend_within_one_block_moves_coin_between_owners() {
        let store = Arc::new(NullStore::new());
        let idx = index(&store);
        let a = pay(vec![], utility(), 1, 50);
        let b = pay(vec![CoinReference::new(a.hash(), 0)], utility(), 2, 50);
        let b_hash = b.hash();

        idx.index_block(&block(0, vec![a, b])).unwrap();

        assert!(idx.get_spendable(&owner(1)).unwrap().is_empty());
        assert_eq!(idx.get_spendable(&owner(2)).unwrap(), vec![CoinReference::new(b_hash, 0)]);
        // Utility outputs never become claimable.
        assert!(idx.get_claimable(&owner(1)).unwrap().is_empty());
    }

    #[test]
    fn spent_governing_output_becomes_claimable_until_claimed() {
        let store = Arc::new(NullStore::new());
        let idx = index(&store);
        let grant = pay(vec![], governing(), 1, 10);
        let spent = CoinReference::new(grant.hash(), 0);
        store.put_transaction(&grant.hash(), &grant).unwrap();
        idx.index_block(&block(0, vec![grant])).unwrap();

        let transfer = pay(vec![spent], governing(), 2, 10);
        idx.index_block(&block(1, vec![transfer])).unwrap();
        assert_eq!(idx.get_claimable(&owner(1)).unwrap(), vec![spent]);

        let claim = Transaction::new(
            TransactionKind::Claim { claims: vec![spent] },
            vec![],
            vec![TransactionOutput::new(utility(), Fixed8::from_raw(3), owner(1))],
        );
        idx.index_block(&block(2, vec![claim])).unwrap();

        assert!(idx.get_claimable(&owner(1)).unwrap().is_empty());
        assert_eq!(idx.get_spendable(&owner(1)).unwrap().len(), 1);
        assert_eq!(idx.get_height().unwrap(), Some(2));
    }

    #[test]
    fn output_index_beyond_u16_is_rejected() {
        let store = Arc::new(NullStore::new());
        let outputs = (0..=u32::from(u16::MAX) + 1)
            .map(|i| {
                let mut owner = [0u8; 20];
                owner[..4].copy_from_slice(&i.to_le_bytes());
                TransactionOutput::new(utility(), Fixed8::from_raw(1), ScriptHash::new(owner))
            })
            .collect();
        let wide = Transaction::new(TransactionKind::Contract, vec![], outputs);

        let err = index(&store).index_block(&block(0, vec![wide])).unwrap_err();
        assert!(matches!(err, LedgerError::OutputIndexOutOfRange { index: u16::MAX, .. }));
        assert_eq!(index(&store).get_height().unwrap(), None);
    }

    #[test]
    fn replaying_a_block_after_lost_height_write_is_idempotent() {
        let store = Arc::new(NullStore::new());
        let idx = index(&store);
        let grant = pay(vec![], governing(), 1, 10);
        store.put_transaction(&grant.hash(), &grant).unwrap();
        idx.index_block(&block(0, vec![grant.clone()])).unwrap();

        let spent = CoinReference::new(grant.hash(), 0);
        let transfer = pay(vec![spent], governing(), 2, 10);
        let next = block(1, vec![transfer.clone()]);
        idx.index_block(&next).unwrap();
        // Sets were written but the height update never landed.
        store.set_index_height(0).unwrap();
        idx.index_block(&next).unwrap();

        assert_eq!(idx.get_claimable(&owner(1)).unwrap(), vec![spent]);
        assert_eq!(
            idx.get_spendable(&owner(2)).unwrap(),
            vec![CoinReference::new(transfer.hash(), 0)]
        );
        assert!(idx.get_spendable(&owner(1)).unwrap().is_empty());
    }
}
