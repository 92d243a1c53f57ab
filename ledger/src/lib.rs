//! UTXO ledger state transitions.
//!
//! The [`TransactionProcessor`] applies the spend/gain effect shared by every
//! transaction and dispatches to one processor per transaction kind. The
//! [`CoinIndex`] derives per-address coin sets from the applied chain, and the
//! genesis module builds the deterministic first block of each network.

pub mod coin_index;
pub mod error;
pub mod genesis;
pub mod ledger;
pub mod processors;
pub mod staged;
pub mod transaction_processor;

pub use coin_index::CoinIndex;
pub use error::LedgerError;
pub use genesis::{create_genesis_block, genesis_hash, GenesisConfig};
pub use ledger::{Ledger, LedgerSummary};
pub use processors::{InvocationExecutor, UnsupportedInvocation};
pub use staged::StagedWrites;
pub use transaction_processor::TransactionProcessor;
