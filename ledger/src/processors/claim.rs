//! Claim transactions: mark the claimed outputs so they cannot be claimed twice.

use std::collections::BTreeMap;

use strata_types::{CoinReference, CoinState, TxHash};

use crate::{LedgerError, StagedWrites};

/// Applies the `CLAIMED` flag to every output a Claim transaction references.
///
/// The claimed utility itself reaches the claimant through the transaction's
/// outputs, which the generic output step already credits.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClaimProcessor;

impl ClaimProcessor {
    pub fn process(
        &self,
        staged: &mut StagedWrites<'_>,
        claims: &[CoinReference],
    ) -> Result<(), LedgerError> {
        let mut grouped: BTreeMap<TxHash, Vec<u16>> = BTreeMap::new();
        for claim in claims {
            grouped.entry(claim.prev_hash).or_default().push(claim.prev_index);
        }

        for (prev_hash, indexes) in grouped {
            let mut states = staged
                .coin_states(&prev_hash)?
                .ok_or(LedgerError::MissingCoinStates(prev_hash))?;
            for index in indexes {
                let state = states
                    .get_mut(index as usize)
                    .ok_or(LedgerError::OutputIndexOutOfRange {
                        hash: prev_hash,
                        index,
                    })?;
                state.insert(CoinState::CLAIMED);
            }
            staged.put_coin_states(prev_hash, states);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_nullables::NullStore;
    use strata_store::{BatchStore, CoinStateStore};

    fn claim(store: &NullStore, claims: &[CoinReference]) -> Result<(), LedgerError> {
        let mut staged = StagedWrites::new(store);
        ClaimProcessor.process(&mut staged, claims)?;
        store.commit(staged.into_batch())?;
        Ok(())
    }

    #[test]
    fn claimed_flag_is_added_to_existing_flags() {
        let store = NullStore::new();
        let prev = TxHash::new([0x10; 32]);
        store
            .put_coin_states(&prev, &[CoinState::CONFIRMED; 3])
            .unwrap();

        let claims: Vec<_> = (0..3).map(|i| CoinReference::new(prev, i)).collect();
        claim(&store, &claims).unwrap();

        let states = store.get_coin_states(&prev).unwrap().unwrap();
        for state in states {
            assert!(state.contains(CoinState::CONFIRMED));
            assert!(state.contains(CoinState::CLAIMED));
        }
    }

    #[test]
    fn only_referenced_outputs_are_claimed() {
        let store = NullStore::new();
        let prev = TxHash::new([0x11; 32]);
        store.put_coin_states(&prev, &[CoinState::SPENT; 2]).unwrap();

        claim(&store, &[CoinReference::new(prev, 1)]).unwrap();

        let states = store.get_coin_states(&prev).unwrap().unwrap();
        assert!(!states[0].contains(CoinState::CLAIMED));
        assert!(states[1].contains(CoinState::CLAIMED | CoinState::SPENT));
    }

    #[test]
    fn claiming_unknown_transaction_fails() {
        let store = NullStore::new();
        let prev = TxHash::new([0x12; 32]);
        let err = claim(&store, &[CoinReference::new(prev, 0)]).unwrap_err();
        assert!(matches!(err, LedgerError::MissingCoinStates(h) if h == prev));
    }

    #[test]
    fn claiming_past_the_last_output_fails() {
        let store = NullStore::new();
        let prev = TxHash::new([0x13; 32]);
        store.put_coin_states(&prev, &[CoinState::NEW]).unwrap();
        let err = claim(&store, &[CoinReference::new(prev, 4)]).unwrap_err();
        assert!(matches!(err, LedgerError::OutputIndexOutOfRange { index: 4, .. }));
    }
}
