//! Invocation transactions.
//!
//! Script execution belongs to the virtual machine, which lives outside this
//! crate. The ledger only defines the seam it is plugged into.

use strata_types::{Fixed8, Transaction};

use crate::{LedgerError, StagedWrites};

/// Executes the script carried by an Invocation transaction.
///
/// State changes go into `staged` so they commit together with the rest of
/// the transaction.
pub trait InvocationExecutor: Send + Sync {
    fn execute(
        &self,
        staged: &mut StagedWrites<'_>,
        tx: &Transaction,
        script: &[u8],
        gas: Fixed8,
    ) -> Result<(), LedgerError>;
}

/// Executor used when no virtual machine is attached. Every invocation fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnsupportedInvocation;

impl InvocationExecutor for UnsupportedInvocation {
    fn execute(
        &self,
        _staged: &mut StagedWrites<'_>,
        _tx: &Transaction,
        _script: &[u8],
        _gas: Fixed8,
    ) -> Result<(), LedgerError> {
        Err(LedgerError::UnsupportedTransactionKind("Invocation"))
    }
}
