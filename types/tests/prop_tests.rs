use proptest::prelude::*;

use strata_types::{
    Block, BlockHash, CoinState, Fixed8, ScriptHash, Timestamp, Transaction, TransactionKind,
    TransactionOutput, TxHash,
};

fn flag_strategy() -> impl Strategy<Value = CoinState> {
    prop_oneof![
        Just(CoinState::NEW),
        Just(CoinState::CONFIRMED),
        Just(CoinState::SPENT),
        Just(CoinState::CLAIMED),
    ]
}

proptest! {
    /// Once a flag is set, no sequence of further insertions clears it.
    #[test]
    fn coin_state_flags_are_monotone(
        first in flag_strategy(),
        rest in prop::collection::vec(flag_strategy(), 0..16),
    ) {
        let mut state = CoinState::UNCONFIRMED;
        state.insert(first);
        for flag in rest {
            let before = state;
            state |= flag;
            prop_assert!(state.contains(before));
            prop_assert!(state.contains(first));
        }
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u32..u32::MAX, b in 0u32..u32::MAX) {
        prop_assert_eq!(Timestamp::new(a) <= Timestamp::new(b), a <= b);
    }

    /// Fixed8: checked_add(a, b) == Some(a + b) when no overflow.
    #[test]
    fn fixed8_checked_add(a in -1_000_000_000_000i64..1_000_000_000_000, b in -1_000_000_000_000i64..1_000_000_000_000) {
        let sum = Fixed8::from_raw(a).checked_add(Fixed8::from_raw(b));
        prop_assert_eq!(sum, Some(Fixed8::from_raw(a + b)));
    }

    /// Fixed8: a delta and its negation cancel out.
    #[test]
    fn fixed8_negation_cancels(raw in -1_000_000_000_000i64..1_000_000_000_000) {
        let v = Fixed8::from_raw(raw);
        prop_assert!((v + -v).is_zero());
    }

    /// A block and its truncated header always agree on the hash.
    #[test]
    fn header_hash_agrees_with_block(
        index in 0u32..1_000_000,
        ts in 0u32..u32::MAX,
        prev in prop::array::uniform32(0u8..),
        values in prop::collection::vec(1i64..1_000_000, 0..5),
    ) {
        let outputs = values
            .into_iter()
            .map(|v| TransactionOutput::new(TxHash::new([7; 32]), Fixed8::from_raw(v), ScriptHash::new([9; 20])))
            .collect();
        let block = Block::new(
            index,
            BlockHash::new(prev),
            Timestamp::new(ts),
            vec![Transaction::new(TransactionKind::Contract, vec![], outputs)],
        );
        let mut header = block.header();
        header.hash = None;
        prop_assert_eq!(header.ensure_hash(), block.hash());
    }

    /// Blocks at different heights never share a hash.
    #[test]
    fn index_changes_block_hash(a in 0u32..1_000_000, b in 0u32..1_000_000) {
        prop_assume!(a != b);
        let ba = Block::new(a, BlockHash::ZERO, Timestamp::new(1), vec![]);
        let bb = Block::new(b, BlockHash::ZERO, Timestamp::new(1), vec![]);
        prop_assert_ne!(ba.hash(), bb.hash());
    }
}
