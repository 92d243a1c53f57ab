//! Block pool: bounded buffer of blocks that arrived ahead of the persisted height.
//!
//! Peers deliver blocks in any order. The pool keeps at most one block per
//! index, validates each against its nearest lower neighbour (or the persisted
//! tip), drops buffered descendants that stop being valid successors, and
//! evicts the highest indexes first once it grows past capacity.
//!
//! The backing map is a [`DashMap`], so producers (peer handlers) and the
//! single consumer (the processor loop) share it without caller-side locking.

use std::sync::{Arc, RwLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

use strata_types::{Block, BlockHash, BlockHeader, Timestamp};

use crate::ledger_event::{EventBus, LedgerEvent};
use crate::metrics::NodeMetrics;
use crate::NodeError;

/// Default maximum number of buffered blocks.
pub const DEFAULT_POOL_CAPACITY: usize = 10_000;

#[derive(Clone)]
struct PoolEntry {
    block: Arc<Block>,
    hash: BlockHash,
}

/// What a candidate block is validated against.
#[derive(Clone, Copy, Debug)]
struct Anchor {
    index: u32,
    hash: BlockHash,
    timestamp: Timestamp,
}

impl From<&PoolEntry> for Anchor {
    fn from(entry: &PoolEntry) -> Self {
        Self {
            index: entry.block.index,
            hash: entry.hash,
            timestamp: entry.block.timestamp,
        }
    }
}

impl From<&BlockHeader> for Anchor {
    fn from(header: &BlockHeader) -> Self {
        Self {
            index: header.index,
            hash: header.hash(),
            timestamp: header.timestamp,
        }
    }
}

pub struct BlockPool {
    blocks: DashMap<u32, PoolEntry>,
    capacity: usize,
    genesis_hash: BlockHash,
    /// Last persisted block, maintained by the processor.
    current: RwLock<Option<BlockHeader>>,
    events: EventBus,
    available: Notify,
    metrics: Option<Arc<NodeMetrics>>,
}

impl BlockPool {
    pub fn new(capacity: usize, genesis_hash: BlockHash) -> Result<Self, NodeError> {
        if capacity == 0 {
            return Err(NodeError::InvalidArgument(
                "block pool capacity must be at least 1".into(),
            ));
        }
        Ok(Self {
            blocks: DashMap::new(),
            capacity,
            genesis_hash,
            current: RwLock::new(None),
            events: EventBus::new(),
            available: Notify::new(),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<NodeMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn try_get(&self, index: u32) -> Option<Arc<Block>> {
        self.blocks.get(&index).map(|entry| Arc::clone(&entry.block))
    }

    /// Queue a block.
    ///
    /// Fails with `ValidationFailed` if the block is stale, does not move time
    /// forward, or does not extend its adjacent predecessor, and with
    /// `Conflict` if a block is already queued at its index.
    pub fn add(&self, block: Block) -> Result<(), NodeError> {
        let hash = block.hash();
        let current = self.current();

        if let Err(e) = self.validate(&block, &hash, current.as_ref()) {
            self.reject(&block, &hash, &e);
            return Err(e);
        }

        let index = block.index;
        let block = Arc::new(block);
        let inserted = match self.blocks.entry(index) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(PoolEntry {
                    block: Arc::clone(&block),
                    hash,
                });
                true
            }
        };
        if !inserted {
            let e = NodeError::Conflict(format!("a block is already queued at index {index}"));
            self.reject(&block, &hash, &e);
            return Err(e);
        }

        tracing::debug!(index, hash = %hash, size = self.blocks.len(), "block added to pool");
        if let Some(m) = &self.metrics {
            m.blocks_added.inc();
        }
        self.events.emit(&LedgerEvent::BlockAdded(block));
        self.available.notify_one();

        self.prune_forks(current.as_ref());
        self.evict_over_capacity();
        self.update_size_gauge();
        Ok(())
    }

    /// Whether a block with this hash is buffered.
    pub fn contains(&self, hash: &BlockHash) -> Result<bool, NodeError> {
        if hash.is_zero() {
            return Err(NodeError::InvalidValue("block hash must not be zero".into()));
        }
        Ok(self.blocks.iter().any(|entry| entry.hash == *hash))
    }

    /// Drop the block at `index`, if any.
    pub fn remove(&self, index: u32) -> Option<Arc<Block>> {
        let removed = self.blocks.remove(&index).map(|(_, entry)| entry.block);
        self.update_size_gauge();
        removed
    }

    pub fn size(&self) -> usize {
        self.blocks.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Buffered indexes in ascending order.
    pub fn indexes(&self) -> Vec<u32> {
        let mut indexes: Vec<u32> = self.blocks.iter().map(|entry| *entry.key()).collect();
        indexes.sort_unstable();
        indexes
    }

    /// The persisted block new arrivals are validated against when nothing
    /// lower is buffered.
    pub fn current(&self) -> Option<BlockHeader> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_current(&self, header: Option<BlockHeader>) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = header;
    }

    /// Register a listener for [`LedgerEvent::BlockAdded`].
    pub fn subscribe(&self, listener: impl Fn(&LedgerEvent) + Send + Sync + 'static) {
        self.events.subscribe(listener);
    }

    /// Resolves after the next successful `add` (or immediately if one
    /// happened since the last wait).
    pub fn notified(&self) -> Notified<'_> {
        self.available.notified()
    }

    fn validate(
        &self,
        block: &Block,
        hash: &BlockHash,
        current: Option<&BlockHeader>,
    ) -> Result<(), NodeError> {
        let predecessor = self
            .predecessor_of(block.index)
            .or_else(|| current.map(Anchor::from));
        match predecessor {
            Some(anchor) => check_successor(block, &anchor),
            None => self.check_genesis(block.index, hash),
        }
    }

    fn check_genesis(&self, index: u32, hash: &BlockHash) -> Result<(), NodeError> {
        if index != 0 {
            return Err(NodeError::ValidationFailed(format!(
                "nothing persisted yet, only the genesis block can be queued (got index {index})"
            )));
        }
        if *hash != self.genesis_hash {
            return Err(NodeError::ValidationFailed(format!(
                "genesis hash mismatch: expected {}, got {hash}",
                self.genesis_hash
            )));
        }
        Ok(())
    }

    /// Highest buffered block below `index`.
    fn predecessor_of(&self, index: u32) -> Option<Anchor> {
        self.blocks
            .iter()
            .filter(|entry| *entry.key() < index)
            .max_by_key(|entry| *entry.key())
            .map(|entry| Anchor::from(entry.value()))
    }

    /// Re-validate every buffered block against its predecessor, lowest first,
    /// and drop the ones that no longer fit.
    fn prune_forks(&self, current: Option<&BlockHeader>) {
        let mut previous = current.map(Anchor::from);
        for index in self.indexes() {
            let Some(entry) = self.blocks.get(&index).map(|e| e.value().clone()) else {
                continue;
            };
            let valid = match &previous {
                Some(anchor) => check_successor(&entry.block, anchor).is_ok(),
                None => self.check_genesis(index, &entry.hash).is_ok(),
            };
            if valid {
                previous = Some(Anchor::from(&entry));
            } else {
                self.blocks.remove(&index);
                tracing::debug!(index, hash = %entry.hash, "pruned block that no longer extends the chain");
            }
        }
    }

    fn evict_over_capacity(&self) {
        let size = self.blocks.len();
        if size <= self.capacity {
            return;
        }
        let mut indexes = self.indexes();
        indexes.reverse();
        for index in indexes.into_iter().take(size - self.capacity) {
            self.blocks.remove(&index);
            tracing::debug!(index, "evicted block over pool capacity");
        }
    }

    fn reject(&self, block: &Block, hash: &BlockHash, error: &NodeError) {
        tracing::debug!(index = block.index, hash = %hash, error = %error, "block rejected by pool");
        if let Some(m) = &self.metrics {
            m.blocks_rejected.inc();
        }
    }

    fn update_size_gauge(&self) {
        if let Some(m) = &self.metrics {
            m.pool_size.set(self.blocks.len() as i64);
        }
    }
}

fn check_successor(block: &Block, predecessor: &Anchor) -> Result<(), NodeError> {
    if block.index <= predecessor.index {
        return Err(NodeError::ValidationFailed(format!(
            "stale block: index {} is not above {}",
            block.index, predecessor.index
        )));
    }
    if block.timestamp <= predecessor.timestamp {
        return Err(NodeError::ValidationFailed(format!(
            "timestamp {} does not advance past {} of block {}",
            block.timestamp.as_secs(),
            predecessor.timestamp.as_secs(),
            predecessor.index
        )));
    }
    if block.index == predecessor.index + 1 && block.previous_hash != predecessor.hash {
        return Err(NodeError::ValidationFailed(format!(
            "block {} does not extend {} at index {}",
            block.index, predecessor.hash, predecessor.index
        )));
    }
    Ok(())
}
