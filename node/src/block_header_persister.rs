//! Header-first sync: commits block headers in strict chain order.
//!
//! Header persistence runs independently of full-block persistence and may be
//! ahead of it. Each batch is filtered to headers above the last persisted
//! one, de-duplicated by index (first occurrence wins), sorted, and committed
//! until the first header that does not extend the chain.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use strata_ledger::{genesis_hash, GenesisConfig, Ledger};
use strata_types::{BlockHash, BlockHeader};

use crate::ledger_event::{EventBus, LedgerEvent};
use crate::metrics::NodeMetrics;
use crate::tracing_spans::header_persist_span;
use crate::NodeError;

pub struct BlockHeaderPersister {
    ledger: Arc<dyn Ledger>,
    genesis_hash: BlockHash,
    /// Also serializes concurrent batches.
    last: Mutex<Option<BlockHeader>>,
    events: EventBus,
    metrics: Option<Arc<NodeMetrics>>,
}

impl BlockHeaderPersister {
    /// Create a persister resuming from the ledger's recorded header height.
    pub fn new(ledger: Arc<dyn Ledger>, genesis: &GenesisConfig) -> Result<Self, NodeError> {
        let last = match ledger.get_total_block_header_height()? {
            Some(height) => ledger.get_block_header_by_height(height)?,
            None => None,
        };
        Ok(Self {
            ledger,
            genesis_hash: genesis_hash(genesis),
            last: Mutex::new(last),
            events: EventBus::new(),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<NodeMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn last_persisted(&self) -> Option<BlockHeader> {
        self.last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Register a listener for [`LedgerEvent::HeadersPersisted`].
    pub fn subscribe(&self, listener: impl Fn(&LedgerEvent) + Send + Sync + 'static) {
        self.events.subscribe(listener);
    }

    /// Persist a batch of headers.
    ///
    /// Returns how many were committed. If a header fails validation the
    /// ones before it stay committed (and are announced), and the failure is
    /// returned as `ValidationFailed`.
    pub fn persist(&self, headers: Vec<BlockHeader>) -> Result<usize, NodeError> {
        let _span = header_persist_span(headers.len()).entered();
        let mut last = self
            .last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let floor = last.as_ref().map(|h| h.index);
        let mut candidates: BTreeMap<u32, BlockHeader> = BTreeMap::new();
        for header in headers {
            if floor.is_some_and(|f| header.index <= f) {
                continue;
            }
            candidates.entry(header.index).or_insert(header);
        }

        let mut persisted = Vec::new();
        let mut failure = None;
        for (_, mut header) in candidates {
            let hash = header.ensure_hash();
            if let Err(e) = self.validate(&header, &hash, last.as_ref()) {
                tracing::warn!(index = header.index, hash = %hash, error = %e, "header rejected");
                failure = Some(e);
                break;
            }
            // The block processor may have committed this block already.
            if !self.ledger.is_block_persisted(&hash)? {
                self.ledger.put_block_header(&header)?;
            }
            self.ledger.set_total_block_header_height(header.index)?;
            *last = Some(header.clone());
            persisted.push(header);
        }
        drop(last);

        if let Some(newest) = persisted.last() {
            tracing::info!(count = persisted.len(), height = newest.index, "headers persisted");
            if let Some(m) = &self.metrics {
                m.headers_persisted.inc_by(persisted.len() as u64);
                m.header_height.set(i64::from(newest.index));
            }
        }
        let count = persisted.len();
        if count > 0 {
            self.events.emit(&LedgerEvent::HeadersPersisted(persisted));
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(count),
        }
    }

    fn validate(
        &self,
        header: &BlockHeader,
        hash: &BlockHash,
        last: Option<&BlockHeader>,
    ) -> Result<(), NodeError> {
        match last {
            Some(last) => {
                if header.index != last.index + 1 {
                    return Err(NodeError::ValidationFailed(format!(
                        "header {} does not follow {}",
                        header.index, last.index
                    )));
                }
                let last_hash = last.hash();
                if header.previous_hash != last_hash {
                    return Err(NodeError::ValidationFailed(format!(
                        "header {} does not link to {last_hash}",
                        header.index
                    )));
                }
            }
            None => {
                if header.index != 0 {
                    return Err(NodeError::ValidationFailed(format!(
                        "first header must be genesis (got index {})",
                        header.index
                    )));
                }
                if *hash != self.genesis_hash {
                    return Err(NodeError::ValidationFailed(format!(
                        "genesis header hash mismatch: expected {}, got {hash}",
                        self.genesis_hash
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use strata_ledger::create_genesis_block;
    use strata_nullables::NullStore;
    use strata_store::{BlockStore, MetaStore};
    use strata_types::{Block, HeaderKind, Timestamp, Transaction, TransactionKind};

    fn chain(n: u32) -> Vec<Block> {
        let mut blocks = vec![create_genesis_block(&GenesisConfig::default())];
        for i in 1..=n {
            let parent = &blocks[i as usize - 1];
            let block = Block::new(
                i,
                parent.hash(),
                Timestamp::new(parent.timestamp.as_secs() + 15),
                vec![Transaction::new(TransactionKind::Miner { nonce: i }, vec![], vec![])],
            );
            blocks.push(block);
        }
        blocks
    }

    /// Headers as peers send them: no cached hash.
    fn wire_headers(blocks: &[Block]) -> Vec<BlockHeader> {
        blocks
            .iter()
            .map(|b| {
                let mut h = b.header();
                h.hash = None;
                h
            })
            .collect()
    }

    fn persister(store: &Arc<NullStore>) -> BlockHeaderPersister {
        BlockHeaderPersister::new(store.clone(), &GenesisConfig::default()).unwrap()
    }

    #[test]
    fn unordered_batch_with_duplicates_is_committed_in_order() {
        let store = Arc::new(NullStore::new());
        let p = persister(&store);
        let blocks = chain(3);
        let mut batch = wire_headers(&blocks);
        batch.reverse();
        batch.push(blocks[2].header());

        assert_eq!(p.persist(batch).unwrap(), 4);
        assert_eq!(store.get_total_block_header_height().unwrap(), Some(3));
        assert_eq!(p.last_persisted().unwrap().hash(), blocks[3].hash());
        let stored = store.get_block_header_by_height(2).unwrap().unwrap();
        assert_eq!(stored.kind, HeaderKind::Header);
        assert_eq!(stored.hash, Some(blocks[2].hash()));
    }

    #[test]
    fn first_header_must_match_genesis() {
        let store = Arc::new(NullStore::new());
        let p = persister(&store);
        let mut fake = chain(0)[0].header();
        fake.consensus_data ^= 1;
        fake.hash = None;

        assert!(matches!(p.persist(vec![fake]), Err(NodeError::ValidationFailed(_))));
        assert!(p.last_persisted().is_none());
        assert_eq!(store.get_total_block_header_height().unwrap(), None);
    }

    #[test]
    fn stops_at_first_broken_link_and_announces_prefix() {
        let store = Arc::new(NullStore::new());
        let p = persister(&store);
        let announced = Arc::new(AtomicUsize::new(0));
        let a = Arc::clone(&announced);
        p.subscribe(move |event| {
            if let LedgerEvent::HeadersPersisted(headers) = event {
                a.store(headers.len(), Ordering::SeqCst);
            }
        });

        let blocks = chain(4);
        let mut batch = wire_headers(&blocks);
        batch[2].previous_hash = BlockHash::new([0x13; 32]);

        assert!(matches!(p.persist(batch), Err(NodeError::ValidationFailed(_))));
        assert_eq!(announced.load(Ordering::SeqCst), 2);
        assert_eq!(p.last_persisted().unwrap().index, 1);
        assert_eq!(store.get_total_block_header_height().unwrap(), Some(1));
        assert!(store.get_block_header_by_height(3).unwrap().is_none());
    }

    #[test]
    fn already_persisted_headers_are_skipped() {
        let store = Arc::new(NullStore::new());
        let p = persister(&store);
        let blocks = chain(3);
        p.persist(wire_headers(&blocks[..2])).unwrap();

        assert_eq!(p.persist(wire_headers(&blocks)).unwrap(), 2);
        assert_eq!(p.persist(wire_headers(&blocks)).unwrap(), 0);
        assert_eq!(p.persist(vec![]).unwrap(), 0);
    }

    #[test]
    fn gap_after_last_persisted_is_rejected() {
        let store = Arc::new(NullStore::new());
        let p = persister(&store);
        let blocks = chain(3);
        p.persist(wire_headers(&blocks[..1])).unwrap();

        let err = p.persist(wire_headers(&blocks[2..])).unwrap_err();
        assert!(matches!(err, NodeError::ValidationFailed(_)));
        assert_eq!(p.last_persisted().unwrap().index, 0);
    }

    #[test]
    fn resumes_from_recorded_height() {
        let store = Arc::new(NullStore::new());
        let blocks = chain(2);
        persister(&store).persist(wire_headers(&blocks[..2])).unwrap();

        let resumed = persister(&store);
        assert_eq!(resumed.last_persisted().unwrap().index, 1);
        assert_eq!(resumed.persist(wire_headers(&blocks)).unwrap(), 1);
    }

    #[test]
    fn header_of_fully_persisted_block_keeps_extended_entry() {
        let store = Arc::new(NullStore::new());
        let blocks = chain(1);
        store.put_block_header(&blocks[0].extended_header()).unwrap();
        store.set_total_block_height(0).unwrap();

        let p = persister(&store);
        assert_eq!(p.persist(wire_headers(&blocks)).unwrap(), 2);

        let genesis = store.get_block_header(&blocks[0].hash()).unwrap().unwrap();
        assert_eq!(genesis.kind, HeaderKind::Extended);
        assert!(store.is_block_persisted(&blocks[0].hash()).unwrap());
        assert_eq!(store.get_total_block_header_height().unwrap(), Some(1));
        assert_eq!(p.last_persisted().unwrap().index, 1);
    }
}
