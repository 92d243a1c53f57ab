//! Block processor: the sequencing engine.
//!
//! One background task owns all ledger mutation. It repeatedly looks up the
//! block at `cursor + 1` in the [`BlockPool`] and, when present, applies its
//! transactions in array order, commits the extended header, advances the
//! recorded height and announces the block. It never skips a gap.
//!
//! When the next block is missing the loop waits for whichever comes first:
//! the pool's "block added" hint, the injectable polling delay, or shutdown.
//!
//! Each transaction commits as one atomic batch that includes its own
//! record, so a transaction is either fully applied and recorded or not
//! touched at all. A retry skips the recorded ones and resumes at the first
//! transaction that did not commit. Header and height writes are plain
//! overwrites and the coin index only inserts into sets, so repeating them
//! is harmless.
//!
//! Backend storage failures are retried after a backoff. With
//! `persist_max_retries > 0` the loop gives up after that many consecutive
//! failures. Any other error is a property of the block and stops the loop
//! at once. In both cases the join handle resolves to the error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;

use strata_ledger::{CoinIndex, Ledger, TransactionProcessor};
use strata_store::Mempool;
use strata_types::{Block, BlockHash, BlockHeader, HeaderKind};
use strata_utils::Delay;

use crate::block_pool::BlockPool;
use crate::config::NodeConfig;
use crate::ledger_event::{EventBus, LedgerEvent};
use crate::metrics::NodeMetrics;
use crate::shutdown::ShutdownController;
use crate::tracing_spans::{block_persist_span, transaction_process_span};
use crate::NodeError;

pub struct BlockProcessor {
    ledger: Arc<dyn Ledger>,
    transactions: TransactionProcessor,
    mempool: Arc<dyn Mempool + Send + Sync>,
    delay: Arc<dyn Delay>,
    pool: Arc<BlockPool>,
    coin_index: Option<Arc<CoinIndex>>,
    metrics: Option<Arc<NodeMetrics>>,
    cursor: RwLock<Option<BlockHeader>>,
    events: EventBus,
    shutdown: ShutdownController,
    running: AtomicBool,
    poll_interval: Duration,
    retry_backoff: Duration,
    max_retries: u32,
}

impl BlockProcessor {
    /// Wrap `pool`, which must not be shared with another processor.
    pub fn new(
        ledger: Arc<dyn Ledger>,
        transactions: TransactionProcessor,
        mempool: Arc<dyn Mempool + Send + Sync>,
        delay: Arc<dyn Delay>,
        pool: Arc<BlockPool>,
        config: &NodeConfig,
    ) -> Self {
        Self {
            ledger,
            transactions,
            mempool,
            delay,
            pool,
            coin_index: None,
            metrics: None,
            cursor: RwLock::new(None),
            events: EventBus::new(),
            shutdown: ShutdownController::new(),
            running: AtomicBool::new(false),
            poll_interval: config.poll_interval(),
            retry_backoff: config.persist_retry_backoff(),
            max_retries: config.persist_max_retries,
        }
    }

    /// Keep `index` in lock-step with the processed height.
    pub fn with_coin_index(mut self, index: Arc<CoinIndex>) -> Self {
        self.coin_index = Some(index);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<NodeMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn pool(&self) -> &Arc<BlockPool> {
        &self.pool
    }

    pub fn size(&self) -> usize {
        self.pool.size()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Header of the last block the loop persisted.
    pub fn cursor(&self) -> Option<BlockHeader> {
        self.cursor
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Register a listener for [`LedgerEvent::BlockProcessed`].
    pub fn subscribe(&self, listener: impl Fn(&LedgerEvent) + Send + Sync + 'static) {
        self.events.subscribe(listener);
    }

    /// Queue a block received from a peer.
    pub fn add_block(&self, block: Block) -> Result<(), NodeError> {
        let hash = block.hash();
        if self.contains_block(&hash)? {
            return Err(NodeError::Conflict(format!("block {hash} already on chain")));
        }
        self.pool.add(block)
    }

    /// Whether the block is buffered or already persisted with its body.
    pub fn contains_block(&self, hash: &BlockHash) -> Result<bool, NodeError> {
        if self.pool.contains(hash)? {
            return Ok(true);
        }
        Ok(self.ledger.is_block_persisted(hash)?)
    }

    /// Derive the starting cursor from the ledger after a restart.
    ///
    /// The extended header is written before the height counter. If a crash
    /// landed between the two, the header one past the counter proves the
    /// block was fully applied and the counter is rolled forward to it.
    pub fn recover_cursor(&self) -> Result<Option<BlockHeader>, NodeError> {
        let recorded = self.ledger.get_total_block_height()?;
        let mut cursor = match recorded {
            Some(height) => self.ledger.get_block_header_by_height(height)?,
            None => None,
        };

        let next = recorded.map_or(0, |h| h + 1);
        if let Some(header) = self.ledger.get_block_header_by_height(next)? {
            let extends = match &cursor {
                Some(c) => header.previous_hash == c.hash(),
                None => header.index == 0,
            };
            if header.kind == HeaderKind::Extended && extends {
                tracing::warn!(index = next, "rolling recorded height forward to persisted block");
                self.ledger.set_total_block_height(next)?;
                cursor = Some(header);
            }
        }
        Ok(cursor)
    }

    /// Start the processing loop from `start` (`None` waits for genesis).
    ///
    /// Fails with `Conflict` if the loop was already started.
    pub fn run(
        self: &Arc<Self>,
        start: Option<BlockHeader>,
    ) -> Result<JoinHandle<Result<(), NodeError>>, NodeError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(NodeError::Conflict("block processor already running".into()));
        }
        self.set_cursor(start);

        let processor = Arc::clone(self);
        let mut shutdown_rx = self.shutdown.subscribe();
        Ok(tokio::spawn(async move {
            tracing::info!(
                from = ?processor.cursor().map(|h| h.index),
                "block processor started"
            );
            let mut failures: u32 = 0;

            loop {
                if processor.shutdown.is_triggered() {
                    break;
                }
                let next = processor.cursor().map_or(0, |h| h.index + 1);

                let Some(block) = processor.pool.try_get(next) else {
                    tokio::select! {
                        biased;
                        _ = shutdown_rx.recv() => break,
                        _ = processor.pool.notified() => {}
                        _ = processor.delay.delay(processor.poll_interval) => {}
                    }
                    continue;
                };

                match processor.persist(&block) {
                    Ok(header) => {
                        failures = 0;
                        processor.set_cursor(Some(header));
                        processor.pool.remove(next);
                        processor.events.emit(&LedgerEvent::BlockProcessed(block));
                    }
                    Err(e) => {
                        failures += 1;
                        if let Some(m) = &processor.metrics {
                            m.persist_failures.inc();
                        }
                        if !e.is_retryable() {
                            tracing::error!(index = next, error = %e, "block cannot be applied, processor stopped");
                            processor.running.store(false, Ordering::SeqCst);
                            return Err(e);
                        }
                        tracing::error!(index = next, attempt = failures, error = %e, "block persistence failed");
                        if processor.max_retries > 0 && failures >= processor.max_retries {
                            tracing::error!(index = next, "giving up on block, processor stopped");
                            processor.running.store(false, Ordering::SeqCst);
                            return Err(e);
                        }
                        tokio::select! {
                            biased;
                            _ = shutdown_rx.recv() => break,
                            _ = processor.delay.delay(processor.retry_backoff) => {}
                        }
                    }
                }
            }

            processor.running.store(false, Ordering::SeqCst);
            tracing::info!("block processor stopped");
            Ok(())
        }))
    }

    /// Signal the loop to stop at its next wait. Safe to call more than once.
    pub fn dispose(&self) {
        if self.shutdown.shutdown() {
            tracing::debug!("block processor shutdown requested");
        }
    }

    fn set_cursor(&self, header: Option<BlockHeader>) {
        if let (Some(m), Some(h)) = (&self.metrics, &header) {
            m.block_height.set(i64::from(h.index));
        }
        self.pool.set_current(header.clone());
        *self
            .cursor
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = header;
    }

    /// Apply every transaction in order, then commit the header and height.
    fn persist(&self, block: &Block) -> Result<BlockHeader, NodeError> {
        let header = block.extended_header();
        let hash = header.hash();
        let _span = block_persist_span(block.index, &hash).entered();

        for tx in &block.transactions {
            let tx_hash = tx.hash();
            if self.transactions.is_applied(&tx_hash)? {
                tracing::debug!(hash = %tx_hash, "transaction already applied, skipping");
            } else {
                let _tx_span = transaction_process_span(&tx_hash, tx.kind.name()).entered();
                self.transactions.process(tx)?;
                if let Some(m) = &self.metrics {
                    m.transactions_processed.inc();
                }
            }
            self.mempool.remove(&tx_hash);
        }

        self.ledger.put_block_header(&header)?;
        self.ledger.set_total_block_height(block.index)?;

        if let Some(index) = &self.coin_index {
            if index.get_height()?.map_or(true, |h| h < block.index) {
                index.index_block(block)?;
            }
        }

        if let Some(m) = &self.metrics {
            m.blocks_persisted.inc();
        }
        tracing::info!(
            index = block.index,
            transactions = block.transactions.len(),
            "block persisted"
        );
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_ledger::{create_genesis_block, genesis_hash, GenesisConfig};
    use strata_nullables::{NullDelay, NullMempool, NullStore};
    use strata_store::{BlockStore, MetaStore};
    use strata_types::{Fixed8, Timestamp, Transaction, TransactionKind};

    fn child(parent: &Block) -> Block {
        Block::new(
            parent.index + 1,
            parent.hash(),
            Timestamp::new(parent.timestamp.as_secs() + 15),
            vec![Transaction::new(
                TransactionKind::Miner { nonce: parent.index + 1 },
                vec![],
                vec![],
            )],
        )
    }

    fn processor(store: &Arc<NullStore>) -> BlockProcessor {
        let genesis = GenesisConfig::default();
        let pool = BlockPool::new(16, genesis_hash(&genesis)).unwrap();
        BlockProcessor::new(
            store.clone(),
            TransactionProcessor::new(store.clone()),
            Arc::new(NullMempool::new()),
            Arc::new(NullDelay::new()),
            Arc::new(pool),
            &NodeConfig::default(),
        )
    }

    #[test]
    fn block_already_on_chain_conflicts() {
        let store = Arc::new(NullStore::new());
        let genesis = create_genesis_block(&GenesisConfig::default());
        store.put_block_header(&genesis.extended_header()).unwrap();

        let err = processor(&store).add_block(genesis).unwrap_err();
        assert!(matches!(err, NodeError::Conflict(_)));
    }

    #[test]
    fn header_only_entry_does_not_count_as_on_chain() {
        let store = Arc::new(NullStore::new());
        let genesis = create_genesis_block(&GenesisConfig::default());
        store.put_block_header(&genesis.header()).unwrap();

        let p = processor(&store);
        assert!(!p.contains_block(&genesis.hash()).unwrap());
        p.add_block(genesis.clone()).unwrap();
        assert!(p.contains_block(&genesis.hash()).unwrap());
        assert_eq!(p.size(), 1);
        assert_eq!(p.capacity(), 16);
    }

    #[test]
    fn zero_hash_is_an_invalid_value() {
        let store = Arc::new(NullStore::new());
        let err = processor(&store).contains_block(&BlockHash::ZERO).unwrap_err();
        assert!(matches!(err, NodeError::InvalidValue(_)));
    }

    #[test]
    fn recover_cursor_on_empty_ledger_is_none() {
        let store = Arc::new(NullStore::new());
        assert!(processor(&store).recover_cursor().unwrap().is_none());
    }

    #[test]
    fn recover_cursor_uses_recorded_height() {
        let store = Arc::new(NullStore::new());
        let genesis = create_genesis_block(&GenesisConfig::default());
        let one = child(&genesis);
        store.put_block_header(&genesis.extended_header()).unwrap();
        store.put_block_header(&one.extended_header()).unwrap();
        store.set_total_block_height(1).unwrap();

        let cursor = processor(&store).recover_cursor().unwrap().unwrap();
        assert_eq!(cursor.hash(), one.hash());
    }

    #[test]
    fn recover_cursor_rolls_forward_over_unrecorded_header() {
        let store = Arc::new(NullStore::new());
        let genesis = create_genesis_block(&GenesisConfig::default());
        let one = child(&genesis);
        store.put_block_header(&genesis.extended_header()).unwrap();
        store.set_total_block_height(0).unwrap();
        // Crash after the header write, before the height update.
        store.put_block_header(&one.extended_header()).unwrap();

        let cursor = processor(&store).recover_cursor().unwrap().unwrap();
        assert_eq!(cursor.index, 1);
        assert_eq!(store.get_total_block_height().unwrap(), Some(1));
    }

    #[test]
    fn header_only_entry_past_height_is_not_rolled_forward() {
        let store = Arc::new(NullStore::new());
        let genesis = create_genesis_block(&GenesisConfig::default());
        let one = child(&genesis);
        store.put_block_header(&genesis.extended_header()).unwrap();
        store.set_total_block_height(0).unwrap();
        store.put_block_header(&one.header()).unwrap();

        let cursor = processor(&store).recover_cursor().unwrap().unwrap();
        assert_eq!(cursor.index, 0);
        assert_eq!(store.get_total_block_height().unwrap(), Some(0));
    }

    #[tokio::test]
    async fn second_run_conflicts_and_dispose_stops_loop() {
        let store = Arc::new(NullStore::new());
        let p = Arc::new(processor(&store));

        let handle = p.run(None).unwrap();
        assert!(matches!(p.run(None), Err(NodeError::Conflict(_))));

        p.dispose();
        p.dispose();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unsupported_transaction_stops_loop_without_retrying() {
        let store = Arc::new(NullStore::new());
        let genesis = create_genesis_block(&GenesisConfig::default());
        store.put_block_header(&genesis.extended_header()).unwrap();
        store.set_total_block_height(0).unwrap();

        let one = Block::new(
            1,
            genesis.hash(),
            Timestamp::new(genesis.timestamp.as_secs() + 15),
            vec![Transaction::new(
                TransactionKind::Invocation {
                    script: vec![0x51],
                    gas: Fixed8::ZERO,
                },
                vec![],
                vec![],
            )],
        );

        let p = Arc::new(processor(&store));
        let handle = p.run(Some(genesis.extended_header())).unwrap();
        p.add_block(one).unwrap();

        // Default config retries forever, so only a fatal error ends the loop.
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            result,
            Err(NodeError::Ledger(strata_ledger::LedgerError::UnsupportedTransactionKind(
                "Invocation"
            )))
        ));
        assert_eq!(store.get_total_block_height().unwrap(), Some(0));
        assert_eq!(p.size(), 1);
    }
}
