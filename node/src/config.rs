//! Node configuration with TOML file support.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use strata_ledger::GenesisConfig;
use strata_types::NetworkId;

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for the ingestion pipeline.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Network whose genesis block anchors the chain.
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Maximum number of blocks buffered ahead of the persisted height.
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,

    /// Fallback polling interval of the processor loop.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Wait before retrying a block whose persistence failed.
    #[serde(default = "default_persist_retry_backoff_ms")]
    pub persist_retry_backoff_ms: u64,

    /// Consecutive failures after which the processor loop stops.
    /// `0` retries forever.
    #[serde(default)]
    pub persist_max_retries: u32,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub enable_metrics: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Dev
}

fn default_pool_capacity() -> usize {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_persist_retry_backoff_ms() -> u64 {
    1_000
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), NodeError> {
        if self.pool_capacity == 0 {
            return Err(NodeError::Config("pool_capacity must be at least 1".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(NodeError::Config("poll_interval_ms must be at least 1".into()));
        }
        self.log_format()?;
        EnvFilter::try_new(&self.log_level)
            .map_err(|e| NodeError::Config(format!("invalid log_level: {e}")))?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn persist_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.persist_retry_backoff_ms)
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    /// Canonical genesis parameters of the configured network.
    pub fn genesis(&self) -> GenesisConfig {
        GenesisConfig::for_network(self.network)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            pool_capacity: default_pool_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
            persist_retry_backoff_ms: default_persist_retry_backoff_ms(),
            persist_max_retries: 0,
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = NodeConfig::from_toml_str("").unwrap();
        assert_eq!(config, NodeConfig::default());
        assert_eq!(config.pool_capacity, 10_000);
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.persist_max_retries, 0);
    }

    #[test]
    fn partial_toml_overrides_only_given_keys() {
        let config = NodeConfig::from_toml_str(
            r#"
            network = "test"
            pool_capacity = 64
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.network, NetworkId::Test);
        assert_eq!(config.pool_capacity, 64);
        assert_eq!(config.log_format().unwrap(), LogFormat::Json);
        assert_eq!(config.persist_retry_backoff(), Duration::from_secs(1));
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = NodeConfig::default();
        config.persist_max_retries = 5;
        config.enable_metrics = true;
        let text = config.to_toml_string().unwrap();
        assert_eq!(NodeConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = NodeConfig::from_toml_str("pool_capacity = 0").unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(NodeConfig::from_toml_str("log_format = \"xml\"").is_err());
    }

    #[test]
    fn unparsable_log_level_is_rejected() {
        assert!(NodeConfig::from_toml_str("log_level = \"debug,strata_node=trace\"").is_ok());
        let err = NodeConfig::from_toml_str("log_level = \"strata_node=loud\"").unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_ms = 5").unwrap();
        let config = NodeConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(5));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = NodeConfig::from_toml_file("/nonexistent/strata.toml").unwrap_err();
        assert!(matches!(err, NodeError::Io(_)));
    }

    #[test]
    fn genesis_follows_network() {
        let config = NodeConfig {
            network: NetworkId::Live,
            ..NodeConfig::default()
        };
        assert_eq!(config.genesis(), GenesisConfig::for_network(NetworkId::Live));
    }
}
