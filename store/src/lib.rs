//! Abstract storage traits for the Strata ledger.
//!
//! Every storage backend (a key-value engine, or in-memory for testing)
//! implements these traits. The rest of the codebase depends only on the traits.

pub mod account;
pub mod asset;
pub mod batch;
pub mod block;
pub mod coin_index;
pub mod coin_state;
pub mod contract;
pub mod error;
pub mod mempool;
pub mod meta;
pub mod transaction;
pub mod validator;

pub use account::AccountStore;
pub use asset::AssetStore;
pub use batch::{BatchStore, WriteBatch};
pub use block::BlockStore;
pub use coin_index::CoinIndexStore;
pub use coin_state::CoinStateStore;
pub use contract::ContractStore;
pub use error::StoreError;
pub use mempool::Mempool;
pub use meta::MetaStore;
pub use transaction::TransactionStore;
pub use validator::ValidatorStore;
