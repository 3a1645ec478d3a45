//! Error types for ledger event processing.

use thiserror::Error;

use crate::model::{AgentId, TxId};
use crate::split::SplitError;

/// Top-level error returned by [`Ledger::apply`](super::Ledger::apply).
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("close failed: {0}")]
    Close(#[from] CloseError),

    #[error("{0}")]
    RecordOperation(#[from] RecordOperationError),
}

/// Error while recording a newly closed deal.
#[derive(Debug, Error)]
pub enum CloseError {
    #[error("duplicate transaction id {0}")]
    DuplicateTxId(TxId),

    #[error("deal {0}: agent {1} cannot collaborate with themselves")]
    SameAgent(TxId, AgentId),

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error("deal {0}: ledger totals would overflow")]
    Overflow(TxId),
}

/// The type of operation performed on an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOperation {
    Amend,
    Cancel,
}

/// Unified error for operations on recorded deals (amend, cancel).
#[derive(Debug, Error)]
pub enum RecordOperationError {
    #[error("{0:?}: deal {1} not found")]
    TxNotFound(RecordOperation, TxId),

    #[error("{0:?}: deal {1} was cancelled")]
    Cancelled(RecordOperation, TxId),

    #[error("Amend: deal {0} carries no financial change")]
    NothingToAmend(TxId),

    #[error("Amend: deal {0}: {1}")]
    Recompute(TxId, SplitError),

    #[error("{0:?}: deal {1}: ledger totals would overflow")]
    Overflow(RecordOperation, TxId),
}
