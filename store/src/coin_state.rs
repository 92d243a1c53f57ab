//! Coin-state storage trait.

use crate::StoreError;
use strata_types::{CoinState, TxHash};

/// Trait for the per-transaction coin-state vectors.
///
/// Each vector has one entry per output of the transaction it is keyed by.
pub trait CoinStateStore {
    fn put_coin_states(&self, hash: &TxHash, states: &[CoinState]) -> Result<(), StoreError>;

    fn get_coin_states(&self, hash: &TxHash) -> Result<Option<Vec<CoinState>>, StoreError>;
}
