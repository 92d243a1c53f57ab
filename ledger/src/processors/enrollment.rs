//! Enrollment transactions: register a validator candidate.

use strata_types::{PublicKey, Validator};

use crate::{LedgerError, StagedWrites};

#[derive(Clone, Copy, Debug, Default)]
pub struct EnrollmentProcessor;

impl EnrollmentProcessor {
    /// Mark the validator registered, creating it if unknown. Idempotent.
    pub fn process(
        &self,
        staged: &mut StagedWrites<'_>,
        public_key: &PublicKey,
    ) -> Result<(), LedgerError> {
        let mut validator = staged
            .validator(public_key)?
            .unwrap_or_else(|| Validator::new(*public_key));
        validator.registered = true;
        staged.put_validator(validator);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_nullables::NullStore;
    use strata_store::{BatchStore, ValidatorStore};
    use strata_types::Fixed8;

    fn enroll(store: &NullStore, key: &PublicKey) {
        let mut staged = StagedWrites::new(store);
        EnrollmentProcessor.process(&mut staged, key).unwrap();
        store.commit(staged.into_batch()).unwrap();
    }

    #[test]
    fn unknown_key_becomes_registered_validator() {
        let store = NullStore::new();
        let key = PublicKey::new([0x02; 33]);

        enroll(&store, &key);

        let validator = store.get_validator(&key).unwrap().unwrap();
        assert!(validator.registered);
    }

    #[test]
    fn enrolling_twice_keeps_existing_votes() {
        let store = NullStore::new();
        let key = PublicKey::new([0x03; 33]);
        let mut existing = Validator::new(key);
        existing.votes = Fixed8::from_raw(42);
        store.put_validator(&existing).unwrap();

        enroll(&store, &key);
        enroll(&store, &key);

        let validator = store.get_validator(&key).unwrap().unwrap();
        assert!(validator.registered);
        assert_eq!(validator.votes, Fixed8::from_raw(42));
    }
}
