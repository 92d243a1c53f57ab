//! Transactions and their kind-specific payloads.

use crate::amount::Fixed8;
use crate::asset::AssetType;
use crate::coin::{CoinReference, TransactionOutput};
use crate::contract::{ContractMetadata, ContractParameterType};
use crate::hash::{ScriptHash, TxHash};
use crate::hashing::CanonicalWriter;
use crate::keys::PublicKey;
use serde::{Deserialize, Serialize};

/// Payload of a Register transaction: declares a new asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterPayload {
    pub asset_type: AssetType,
    pub name: String,
    pub amount: Fixed8,
    pub precision: u8,
    pub owner: PublicKey,
    pub admin: ScriptHash,
}

/// Payload of a Publish transaction: a contract script and its metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishPayload {
    pub script: Vec<u8>,
    pub parameter_list: Vec<ContractParameterType>,
    pub return_type: ContractParameterType,
    pub need_storage: bool,
    pub metadata: ContractMetadata,
}

/// The transaction variant together with its variant-specific payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Block reward; carries a nonce so every miner transaction hashes uniquely.
    Miner { nonce: u32 },
    /// Issues units of previously registered assets.
    Issue,
    /// Claims utility generated by spent governing-token outputs.
    Claim { claims: Vec<CoinReference> },
    /// Enrolls a validator candidate.
    Enrollment { public_key: PublicKey },
    Register(RegisterPayload),
    Publish(PublishPayload),
    /// Runs a script in the execution engine.
    Invocation { script: Vec<u8>, gas: Fixed8 },
    /// Plain value transfer.
    Contract,
}

impl TransactionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Miner { .. } => "Miner",
            Self::Issue => "Issue",
            Self::Claim { .. } => "Claim",
            Self::Enrollment { .. } => "Enrollment",
            Self::Register(_) => "Register",
            Self::Publish(_) => "Publish",
            Self::Invocation { .. } => "Invocation",
            Self::Contract => "Contract",
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Self::Miner { .. } => 0x00,
            Self::Issue => 0x01,
            Self::Claim { .. } => 0x02,
            Self::Enrollment { .. } => 0x20,
            Self::Register(_) => 0x40,
            Self::Contract => 0x80,
            Self::Publish(_) => 0xd0,
            Self::Invocation { .. } => 0xd1,
        }
    }

    fn encode(&self, w: &mut CanonicalWriter) {
        w.u8(self.tag());
        match self {
            Self::Miner { nonce } => {
                w.u32(*nonce);
            }
            Self::Issue | Self::Contract => {}
            Self::Claim { claims } => {
                w.u32(claims.len() as u32);
                for claim in claims {
                    claim.encode(w);
                }
            }
            Self::Enrollment { public_key } => {
                w.fixed(public_key.as_bytes());
            }
            Self::Register(p) => {
                w.u8(p.asset_type.tag())
                    .string(&p.name)
                    .i64(p.amount.raw())
                    .u8(p.precision)
                    .fixed(p.owner.as_bytes())
                    .fixed(p.admin.as_bytes());
            }
            Self::Publish(p) => {
                w.var_bytes(&p.script);
                w.u32(p.parameter_list.len() as u32);
                for param in &p.parameter_list {
                    w.u8(param.tag());
                }
                w.u8(p.return_type.tag())
                    .bool(p.need_storage)
                    .string(&p.metadata.name)
                    .string(&p.metadata.code_version)
                    .string(&p.metadata.author)
                    .string(&p.metadata.email)
                    .string(&p.metadata.description);
            }
            Self::Invocation { script, gas } => {
                w.var_bytes(script).i64(gas.raw());
            }
        }
    }
}

/// Free-form attribute attached to a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAttribute {
    pub usage: u8,
    pub data: Vec<u8>,
}

/// Invocation/verification script pair proving the right to spend inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    pub invocation_script: Vec<u8>,
    pub verification_script: Vec<u8>,
}

/// An immutable transaction.
///
/// The hash covers everything except the witnesses, so signing does not
/// change the identity of the transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u8,
    pub kind: TransactionKind,
    pub attributes: Vec<TransactionAttribute>,
    pub inputs: Vec<CoinReference>,
    pub outputs: Vec<TransactionOutput>,
    pub witnesses: Vec<Witness>,
}

impl Transaction {
    /// Build an unsigned version-0 transaction with no attributes.
    pub fn new(
        kind: TransactionKind,
        inputs: Vec<CoinReference>,
        outputs: Vec<TransactionOutput>,
    ) -> Self {
        Self {
            version: 0,
            kind,
            attributes: Vec::new(),
            inputs,
            outputs,
            witnesses: Vec::new(),
        }
    }

    /// Compute the hash of this transaction from its unsigned content.
    pub fn hash(&self) -> TxHash {
        let mut w = CanonicalWriter::new();
        w.u8(self.version);
        self.kind.encode(&mut w);
        w.u32(self.attributes.len() as u32);
        for attr in &self.attributes {
            w.u8(attr.usage).var_bytes(&attr.data);
        }
        w.u32(self.inputs.len() as u32);
        for input in &self.inputs {
            input.encode(&mut w);
        }
        w.u32(self.outputs.len() as u32);
        for output in &self.outputs {
            output.encode(&mut w);
        }
        TxHash::new(w.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(value: i64) -> TransactionOutput {
        TransactionOutput::new(
            TxHash::new([0x11; 32]),
            Fixed8::from_raw(value),
            ScriptHash::new([0x22; 20]),
        )
    }

    #[test]
    fn hash_is_deterministic() {
        let tx = Transaction::new(TransactionKind::Contract, vec![], vec![output(5)]);
        assert_eq!(tx.hash(), tx.clone().hash());
    }

    #[test]
    fn hash_ignores_witnesses() {
        let tx = Transaction::new(TransactionKind::Contract, vec![], vec![output(5)]);
        let mut signed = tx.clone();
        signed.witnesses.push(Witness {
            invocation_script: vec![1, 2, 3],
            verification_script: vec![4, 5],
        });
        assert_eq!(tx.hash(), signed.hash());
    }

    #[test]
    fn hash_covers_kind_payload() {
        let a = Transaction::new(TransactionKind::Miner { nonce: 1 }, vec![], vec![]);
        let b = Transaction::new(TransactionKind::Miner { nonce: 2 }, vec![], vec![]);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn hash_covers_outputs() {
        let a = Transaction::new(TransactionKind::Contract, vec![], vec![output(5)]);
        let b = Transaction::new(TransactionKind::Contract, vec![], vec![output(6)]);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn kind_names() {
        assert_eq!(TransactionKind::Issue.name(), "Issue");
        assert_eq!(
            TransactionKind::Claim { claims: vec![] }.name(),
            "Claim"
        );
    }
}
