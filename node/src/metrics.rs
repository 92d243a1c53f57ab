//! Prometheus metrics for block ingestion.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`] so that several processors
//! can live in one process (tests, embedded use) without name clashes. An
//! exporter can gather it into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, IntCounter, IntGauge,
    Opts, Registry,
};

pub struct NodeMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Blocks accepted into the pool.
    pub blocks_added: IntCounter,
    /// Blocks refused by the pool or the processor.
    pub blocks_rejected: IntCounter,
    /// Blocks fully persisted by the processor loop.
    pub blocks_persisted: IntCounter,
    pub transactions_processed: IntCounter,
    pub headers_persisted: IntCounter,
    /// Failed persistence attempts (each retry counts).
    pub persist_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub pool_size: IntGauge,
    pub block_height: IntGauge,
    pub header_height: IntGauge,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new [`Registry`].
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let blocks_added = register_int_counter_with_registry!(
            Opts::new("strata_blocks_added_total", "Blocks accepted into the block pool"),
            registry
        )?;
        let blocks_rejected = register_int_counter_with_registry!(
            Opts::new("strata_blocks_rejected_total", "Blocks rejected on add"),
            registry
        )?;
        let blocks_persisted = register_int_counter_with_registry!(
            Opts::new("strata_blocks_persisted_total", "Blocks persisted to the ledger"),
            registry
        )?;
        let transactions_processed = register_int_counter_with_registry!(
            Opts::new(
                "strata_transactions_processed_total",
                "Transactions applied to the ledger"
            ),
            registry
        )?;
        let headers_persisted = register_int_counter_with_registry!(
            Opts::new("strata_headers_persisted_total", "Block headers persisted"),
            registry
        )?;
        let persist_failures = register_int_counter_with_registry!(
            Opts::new(
                "strata_persist_failures_total",
                "Failed block persistence attempts"
            ),
            registry
        )?;

        let pool_size = register_int_gauge_with_registry!(
            Opts::new("strata_pool_size", "Blocks currently buffered in the pool"),
            registry
        )?;
        let block_height = register_int_gauge_with_registry!(
            Opts::new("strata_block_height", "Index of the last persisted block"),
            registry
        )?;
        let header_height = register_int_gauge_with_registry!(
            Opts::new("strata_header_height", "Index of the last persisted header"),
            registry
        )?;

        Ok(Self {
            registry,
            blocks_added,
            blocks_rejected,
            blocks_persisted,
            transactions_processed,
            headers_persisted,
            persist_failures,
            pool_size,
            block_height,
            header_height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_metric_is_registered() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.blocks_added.inc();
        metrics.pool_size.set(3);

        let names: Vec<String> = metrics
            .registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert_eq!(names.len(), 9);
        assert!(names.contains(&"strata_blocks_added_total".to_string()));
        assert!(names.contains(&"strata_header_height".to_string()));
    }

    #[test]
    fn separate_instances_do_not_clash() {
        let a = NodeMetrics::new().unwrap();
        let b = NodeMetrics::new().unwrap();
        a.blocks_persisted.inc();
        assert_eq!(a.blocks_persisted.get(), 1);
        assert_eq!(b.blocks_persisted.get(), 0);
    }
}
