//! The ingestion node: wires pool, processor, header persister and coin
//! index over one store according to a [`NodeConfig`].

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use strata_ledger::{genesis_hash, CoinIndex, GenesisConfig, Ledger, TransactionProcessor};
use strata_store::{CoinIndexStore, Mempool};
use strata_utils::Delay;

use crate::block_header_persister::BlockHeaderPersister;
use crate::block_pool::BlockPool;
use crate::block_processor::BlockProcessor;
use crate::config::NodeConfig;
use crate::logging::init_logging;
use crate::metrics::NodeMetrics;
use crate::NodeError;

/// Timeout for the processor loop to wind down on stop.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Node {
    config: NodeConfig,
    genesis: GenesisConfig,
    processor: Arc<BlockProcessor>,
    headers: BlockHeaderPersister,
    metrics: Option<Arc<NodeMetrics>>,
    task: Option<JoinHandle<Result<(), NodeError>>>,
}

impl Node {
    /// Assemble the pipeline over `store`.
    ///
    /// Metrics are only registered when `enable_metrics` is set.
    pub fn new<S>(
        config: NodeConfig,
        store: Arc<S>,
        mempool: Arc<dyn Mempool + Send + Sync>,
        delay: Arc<dyn Delay>,
    ) -> Result<Self, NodeError>
    where
        S: Ledger + CoinIndexStore + 'static,
    {
        config.validate()?;
        let genesis = config.genesis();

        let metrics = if config.enable_metrics {
            let metrics = NodeMetrics::new().map_err(|e| NodeError::Config(e.to_string()))?;
            Some(Arc::new(metrics))
        } else {
            None
        };

        let mut pool = BlockPool::new(config.pool_capacity, genesis_hash(&genesis))?;
        let coin_index = CoinIndex::new(store.clone(), store.clone(), genesis.governing_token());
        let mut headers = BlockHeaderPersister::new(store.clone(), &genesis)?;
        if let Some(m) = &metrics {
            pool = pool.with_metrics(Arc::clone(m));
            headers = headers.with_metrics(Arc::clone(m));
        }

        let mut processor = BlockProcessor::new(
            store.clone(),
            TransactionProcessor::new(store),
            mempool,
            delay,
            Arc::new(pool),
            &config,
        )
        .with_coin_index(Arc::new(coin_index));
        if let Some(m) = &metrics {
            processor = processor.with_metrics(Arc::clone(m));
        }

        Ok(Self {
            config,
            genesis,
            processor: Arc::new(processor),
            headers,
            metrics,
            task: None,
        })
    }

    /// Install the global subscriber with the configured format and level.
    pub fn init_logging(&self) -> Result<(), NodeError> {
        init_logging(self.config.log_format()?, &self.config.log_level)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn genesis(&self) -> &GenesisConfig {
        &self.genesis
    }

    pub fn processor(&self) -> &Arc<BlockProcessor> {
        &self.processor
    }

    pub fn headers(&self) -> &BlockHeaderPersister {
        &self.headers
    }

    /// `None` unless `enable_metrics` is set.
    pub fn metrics(&self) -> Option<&Arc<NodeMetrics>> {
        self.metrics.as_ref()
    }

    /// Recover the cursor from the ledger and start the processor loop.
    pub fn start(&mut self) -> Result<(), NodeError> {
        if self.task.is_some() {
            return Err(NodeError::Conflict("node already started".into()));
        }
        tracing::info!(
            network = ?self.config.network,
            pool_capacity = self.config.pool_capacity,
            metrics = self.config.enable_metrics,
            "node starting"
        );
        let cursor = self.processor.recover_cursor()?;
        self.task = Some(self.processor.run(cursor)?);
        Ok(())
    }

    /// Stop the processor loop and return how it ended.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("node stopping");
        self.processor.dispose();
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(NodeError::Task(e.to_string())),
            Err(_) => {
                tracing::warn!("processor loop did not stop in time");
                Err(NodeError::Task("shutdown timed out".into()))
            }
        }
    }
}
