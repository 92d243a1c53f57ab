//! Validator storage trait.

use crate::StoreError;
use strata_types::{PublicKey, Validator};

pub trait ValidatorStore {
    fn put_validator(&self, validator: &Validator) -> Result<(), StoreError>;

    fn get_validator(&self, public_key: &PublicKey) -> Result<Option<Validator>, StoreError>;
}
