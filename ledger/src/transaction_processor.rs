//! Transaction processor: applies one transaction's effect to the ledger.
//!
//! Every transaction goes through the same three steps:
//!
//! 1. **Spend** each input: OR `SPENT` into the referenced coin state and
//!    debit the previous owner.
//! 2. **Gain** each output: credit the new owner and record a fresh coin-state
//!    vector (`NEW` per output) under the transaction hash.
//! 3. **Dispatch** to the kind processor for the variant-specific effect.
//!
//! All three steps only stage writes. The staged batch, including the
//! transaction record, is committed atomically at the end, so a transaction
//! is either fully applied and recorded or not applied at all. A later
//! transaction in the same block resolves the outputs of an earlier one
//! because each transaction commits before the next is processed.

use std::collections::BTreeMap;
use std::sync::Arc;

use strata_types::{CoinState, Transaction, TransactionKind, TxHash};

use crate::processors::{
    ClaimProcessor, EnrollmentProcessor, InvocationExecutor, IssueProcessor, PublishProcessor,
    RegisterProcessor, UnsupportedInvocation,
};
use crate::{Ledger, LedgerError, StagedWrites};

pub struct TransactionProcessor {
    ledger: Arc<dyn Ledger>,
    claim: ClaimProcessor,
    enrollment: EnrollmentProcessor,
    issue: IssueProcessor,
    register: RegisterProcessor,
    publish: PublishProcessor,
    invocation: Arc<dyn InvocationExecutor>,
}

impl TransactionProcessor {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self {
            ledger,
            claim: ClaimProcessor,
            enrollment: EnrollmentProcessor,
            issue: IssueProcessor,
            register: RegisterProcessor,
            publish: PublishProcessor,
            invocation: Arc::new(UnsupportedInvocation),
        }
    }

    /// Attach the script executor used for Invocation transactions.
    pub fn with_invocation_executor(mut self, executor: Arc<dyn InvocationExecutor>) -> Self {
        self.invocation = executor;
        self
    }

    /// Whether `hash` has already been applied and recorded.
    pub fn is_applied(&self, hash: &TxHash) -> Result<bool, LedgerError> {
        Ok(self.ledger.get_transaction(hash)?.is_some())
    }

    /// Apply `tx` and persist it in one atomic commit.
    pub fn process(&self, tx: &Transaction) -> Result<(), LedgerError> {
        let hash = tx.hash();
        let mut staged = StagedWrites::new(self.ledger.as_ref());

        self.spend_inputs(&mut staged, tx)?;
        self.gain_outputs(&mut staged, &hash, tx)?;

        match &tx.kind {
            TransactionKind::Contract | TransactionKind::Miner { .. } => {}
            TransactionKind::Claim { claims } => self.claim.process(&mut staged, claims)?,
            TransactionKind::Invocation { script, gas } => {
                self.invocation.execute(&mut staged, tx, script, *gas)?
            }
            TransactionKind::Register(payload) => {
                self.register.process(&mut staged, &hash, payload)
            }
            TransactionKind::Issue => self.issue.process(&mut staged, tx)?,
            TransactionKind::Publish(payload) => self.publish.process(&mut staged, payload),
            TransactionKind::Enrollment { public_key } => {
                self.enrollment.process(&mut staged, public_key)?
            }
        }

        let mut batch = staged.into_batch();
        batch.put_transaction(hash, tx.clone());
        self.ledger.commit(batch)?;
        tracing::debug!(hash = %hash, kind = tx.kind.name(), "transaction applied");
        Ok(())
    }

    fn spend_inputs(
        &self,
        staged: &mut StagedWrites<'_>,
        tx: &Transaction,
    ) -> Result<(), LedgerError> {
        let mut grouped: BTreeMap<TxHash, Vec<u16>> = BTreeMap::new();
        for input in &tx.inputs {
            grouped.entry(input.prev_hash).or_default().push(input.prev_index);
        }

        for (prev_hash, indexes) in grouped {
            let prev = staged.require_transaction(&prev_hash)?;
            let mut states = staged
                .coin_states(&prev_hash)?
                .ok_or(LedgerError::MissingCoinStates(prev_hash))?;

            for index in indexes {
                let out_of_range = || LedgerError::OutputIndexOutOfRange {
                    hash: prev_hash,
                    index,
                };
                let output = prev.outputs.get(index as usize).ok_or_else(out_of_range)?;
                let state = states.get_mut(index as usize).ok_or_else(out_of_range)?;
                if state.contains(CoinState::SPENT) {
                    tracing::warn!(prev = %prev_hash, index, "output spent twice");
                }
                state.insert(CoinState::SPENT);
                staged.update_balance(output.script_hash, output.asset_id, -output.value)?;
            }

            staged.put_coin_states(prev_hash, states);
        }
        Ok(())
    }

    fn gain_outputs(
        &self,
        staged: &mut StagedWrites<'_>,
        hash: &TxHash,
        tx: &Transaction,
    ) -> Result<(), LedgerError> {
        for output in &tx.outputs {
            staged.update_balance(output.script_hash, output.asset_id, output.value)?;
        }
        staged.put_coin_states(*hash, vec![CoinState::NEW; tx.outputs.len()]);
        Ok(())
    }
}
