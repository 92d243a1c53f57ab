//! Kind processors: the side effect specific to each transaction variant.
//!
//! The generic spend/gain bookkeeping shared by every transaction is done by
//! [`TransactionProcessor`](crate::TransactionProcessor) before dispatching here.

mod claim;
mod enrollment;
mod invocation;
mod issue;
mod publish;
mod register;

pub use claim::ClaimProcessor;
pub use enrollment::EnrollmentProcessor;
pub use invocation::{InvocationExecutor, UnsupportedInvocation};
pub use issue::IssueProcessor;
pub use publish::PublishProcessor;
pub use register::RegisterProcessor;
