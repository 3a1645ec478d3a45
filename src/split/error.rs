//! Error types for commission allocation.

use thiserror::Error;

use crate::amount::AmountError;
use crate::model::TxId;
use crate::Amount;

/// Error returned by the split calculator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("invalid commission amount: {0}")]
    InvalidAmount(#[from] InvalidAmount),

    #[error("deal {tx}: gross amount {amount} is negative")]
    NegativeGross { tx: TxId, amount: Amount },
}

/// Why a commission amount was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidAmount {
    #[error("{0} is negative")]
    Negative(Amount),

    #[error(transparent)]
    Unrepresentable(#[from] AmountError),
}
