//! UTXO primitives: references to prior outputs, outputs, and per-output state flags.

use crate::amount::Fixed8;
use crate::hash::{AssetId, ScriptHash, TxHash};
use crate::hashing::CanonicalWriter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Reference to one output of a previous transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CoinReference {
    pub prev_hash: TxHash,
    pub prev_index: u16,
}

impl CoinReference {
    pub const fn new(prev_hash: TxHash, prev_index: u16) -> Self {
        Self {
            prev_hash,
            prev_index,
        }
    }

    pub(crate) fn encode(&self, w: &mut CanonicalWriter) {
        w.fixed(self.prev_hash.as_bytes()).u16(self.prev_index);
    }
}

/// A transaction output: `value` of `asset_id` owned by `script_hash`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub asset_id: AssetId,
    pub value: Fixed8,
    pub script_hash: ScriptHash,
}

impl TransactionOutput {
    pub fn new(asset_id: AssetId, value: Fixed8, script_hash: ScriptHash) -> Self {
        Self {
            asset_id,
            value,
            script_hash,
        }
    }

    pub(crate) fn encode(&self, w: &mut CanonicalWriter) {
        w.fixed(self.asset_id.as_bytes())
            .i64(self.value.raw())
            .fixed(self.script_hash.as_bytes());
    }
}

/// Bit-flag state of a single transaction output.
///
/// Flags are only ever added (bitwise OR); once an output is marked `SPENT`
/// or `CLAIMED` it stays marked for the life of the record.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoinState(u8);

impl CoinState {
    pub const UNCONFIRMED: Self = Self(0);
    pub const NEW: Self = Self(1 << 0);
    pub const CONFIRMED: Self = Self(1 << 1);
    pub const SPENT: Self = Self(1 << 2);
    pub const CLAIMED: Self = Self(1 << 3);

    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Whether every flag in `other` is set on `self`.
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Add the flags in `other`. Existing flags are preserved.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl BitOr for CoinState {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CoinState {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

impl fmt::Debug for CoinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(CoinState, &str); 4] = [
            (CoinState::NEW, "New"),
            (CoinState::CONFIRMED, "Confirmed"),
            (CoinState::SPENT, "Spent"),
            (CoinState::CLAIMED, "Claimed"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            write!(f, "Unconfirmed")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}
