//! Runtime errors.

use thiserror::Error;

use tetralog_bytecode::ClauseId;
use tetralog_core::TermOrder;

/// Errors raised while executing a compiled program.
///
/// These all indicate a program/store mismatch: a well-formed query
/// compiled against the store it runs on never raises them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VmError {
    #[error("program references index {0}, which the store has not materialized")]
    UnknownIndex(TermOrder),

    #[error("program references unknown clause {0}")]
    UnknownClause(ClauseId),

    #[error("clause {0} was reserved but never filled")]
    UnfilledClause(ClauseId),
}
