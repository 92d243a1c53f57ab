//! Published contracts.

use crate::hash::ScriptHash;
use serde::{Deserialize, Serialize};

/// Type of a contract parameter or return value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractParameterType {
    Signature,
    Boolean,
    Integer,
    Hash160,
    Hash256,
    ByteArray,
    PublicKey,
    String,
    Array,
    InteropInterface,
    Void,
}

impl ContractParameterType {
    pub fn tag(&self) -> u8 {
        match self {
            Self::Signature => 0x00,
            Self::Boolean => 0x01,
            Self::Integer => 0x02,
            Self::Hash160 => 0x03,
            Self::Hash256 => 0x04,
            Self::ByteArray => 0x05,
            Self::PublicKey => 0x06,
            Self::String => 0x07,
            Self::Array => 0x10,
            Self::InteropInterface => 0xf0,
            Self::Void => 0xff,
        }
    }
}

/// Human-readable metadata attached to a published contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMetadata {
    pub name: String,
    pub code_version: String,
    pub author: String,
    pub email: String,
    pub description: String,
}

/// Ledger record of a published contract, keyed by its script hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub script: Vec<u8>,
    pub parameter_list: Vec<ContractParameterType>,
    pub return_type: ContractParameterType,
    pub need_storage: bool,
    pub metadata: ContractMetadata,
}

impl Contract {
    pub fn script_hash(&self) -> ScriptHash {
        ScriptHash::from_script(&self.script)
    }
}
