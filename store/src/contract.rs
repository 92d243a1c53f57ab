//! Contract storage trait.

use crate::StoreError;
use strata_types::{Contract, ScriptHash};

/// Trait for published contracts, keyed by script hash.
pub trait ContractStore {
    fn put_contract(&self, contract: &Contract) -> Result<(), StoreError>;

    fn get_contract(&self, script_hash: &ScriptHash) -> Result<Option<Contract>, StoreError>;
}
