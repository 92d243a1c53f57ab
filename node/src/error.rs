use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] strata_ledger::LedgerError),

    #[error("store error: {0}")]
    Store(#[from] strata_store::StoreError),

    #[error("config error: {0}")]
    Config(String),

    #[error("task error: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    /// Whether retrying the same operation could succeed.
    ///
    /// Only backend storage failures qualify. Everything else is a property
    /// of the block itself and fails the same way every time.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Ledger(e) => e.is_transient(),
            Self::Store(strata_store::StoreError::Backend(_)) => true,
            _ => false,
        }
    }
}
