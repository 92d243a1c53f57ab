//! Block ingestion for the Strata node.
//!
//! - [`BlockPool`] buffers blocks that arrive ahead of the persisted height.
//! - [`BlockProcessor`] drains the pool strictly in height order and applies
//!   every block through the ledger's transaction processor.
//! - [`BlockHeaderPersister`] commits header chains for header-first sync.
//! - [`Node`] assembles all of the above from a [`NodeConfig`].
//!
//! Configuration, logging, metrics, events and shutdown plumbing live here too.

pub mod block_header_persister;
pub mod block_pool;
pub mod block_processor;
pub mod config;
pub mod error;
pub mod ledger_event;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod shutdown;
pub mod tracing_spans;

pub use block_header_persister::BlockHeaderPersister;
pub use block_pool::{BlockPool, DEFAULT_POOL_CAPACITY};
pub use block_processor::BlockProcessor;
pub use config::NodeConfig;
pub use error::NodeError;
pub use ledger_event::{EventBus, LedgerEvent};
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::Node;
pub use shutdown::ShutdownController;
