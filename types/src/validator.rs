//! Validator candidates.

use crate::amount::Fixed8;
use crate::keys::PublicKey;
use serde::{Deserialize, Serialize};

/// Ledger record of a validator candidate, keyed by its public key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub public_key: PublicKey,
    pub registered: bool,
    #[serde(default)]
    pub votes: Fixed8,
}

impl Validator {
    /// A validator that has not enrolled yet.
    pub fn new(public_key: PublicKey) -> Self {
        Self {
            public_key,
            registered: false,
            votes: Fixed8::ZERO,
        }
    }
}
