//! Fundamental types for the Strata ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! hashes, fixed-point amounts, timestamps, blocks, transactions, coin states and
//! the ledger records (assets, validators, contracts) that transactions mutate.

pub mod amount;
pub mod asset;
pub mod block;
pub mod coin;
pub mod contract;
pub mod hash;
pub mod hashing;
pub mod keys;
pub mod network;
pub mod time;
pub mod transaction;
pub mod validator;

pub use amount::Fixed8;
pub use asset::{Asset, AssetType};
pub use block::{Block, BlockHeader, HeaderKind};
pub use coin::{CoinReference, CoinState, TransactionOutput};
pub use contract::{Contract, ContractMetadata, ContractParameterType};
pub use hash::{AssetId, BlockHash, ScriptHash, TxHash};
pub use keys::PublicKey;
pub use network::NetworkId;
pub use time::Timestamp;
pub use transaction::{
    PublishPayload, RegisterPayload, Transaction, TransactionAttribute, TransactionKind, Witness,
};
pub use validator::Validator;
