//! Registered assets.

use crate::amount::Fixed8;
use crate::hash::{AssetId, ScriptHash};
use crate::keys::PublicKey;
use serde::{Deserialize, Serialize};

/// Kind of a registered asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    /// The asset whose holders vote for validators and accrue claimable utility.
    GoverningToken,
    /// The asset paid out by claims and used for fees.
    UtilityToken,
    Currency,
    Share,
    Invoice,
    Token,
}

impl AssetType {
    /// Stable one-byte tag used in hashed encodings.
    pub fn tag(&self) -> u8 {
        match self {
            Self::GoverningToken => 0x00,
            Self::UtilityToken => 0x01,
            Self::Currency => 0x08,
            Self::Share => 0x90,
            Self::Invoice => 0x98,
            Self::Token => 0x60,
        }
    }
}

/// Ledger record of an asset.
///
/// `available` tracks how much of `amount` has been issued so far and is only
/// changed by Issue and Register transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub asset_type: AssetType,
    pub name: String,
    pub amount: Fixed8,
    pub available: Fixed8,
    pub precision: u8,
    pub owner: PublicKey,
    pub admin: ScriptHash,
}
