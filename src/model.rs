//! Core domain types for commission bookkeeping.

use std::fmt;

use crate::amount::AmountError;
use crate::{Amount, Rate};

/// Deal (transaction) identifier.
pub type TxId = u32;

/// Agent identifier.
pub type AgentId = u32;

/// Kind of closed deal. Decides which commission rate applies by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DealType {
    /// `gross_amount` is the full sale price.
    Sale,
    /// `gross_amount` is one month's rent.
    Rent,
}

impl fmt::Display for DealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DealType::Sale => f.write_str("sale"),
            DealType::Rent => f.write_str("rent"),
        }
    }
}

/// A closed brokerage deal, the entity a commission split is computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct Deal {
    pub tx: TxId,
    pub deal_type: DealType,
    pub gross_amount: Amount,
    /// Fraction of `gross_amount` taken as total commission.
    pub commission_rate: Rate,
    pub primary_agent: AgentId,
    pub collaborating_agent: Option<AgentId>,
    /// Primary agent's fraction of the agents' combined share.
    /// `None` means the default even split.
    pub split_ratio: Option<Rate>,
}

impl Deal {
    /// Total commission pool: `gross_amount * commission_rate`.
    pub fn commission_amount(&self) -> Result<Amount, AmountError> {
        self.gross_amount.mul_rate(self.commission_rate)
    }

    pub fn has_collaborating_agent(&self) -> bool {
        self.collaborating_agent.is_some()
    }
}

/// An input of the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Record a newly closed deal and allocate its commission.
    Close(Deal),
    /// Edit the financial fields of a closed deal; the split is recomputed.
    Amend {
        tx: TxId,
        gross_amount: Option<Amount>,
        commission_rate: Option<Rate>,
    },
    /// Withdraw a closed deal and reverse its allocation.
    Cancel { tx: TxId },
}

impl Event {
    pub fn tx(&self) -> TxId {
        match self {
            Event::Close(deal) => deal.tx,
            Event::Amend { tx, .. } | Event::Cancel { tx } => *tx,
        }
    }
}

/// Allocation of a commission pool between the office and the agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommissionSplit {
    pub office_share: Amount,
    pub primary_agent_share: Amount,
    pub collaborating_agent_share: Amount,
}

impl CommissionSplit {
    /// Sum of the three shares, `None` on overflow.
    pub fn total(&self) -> Option<Amount> {
        self.office_share
            .checked_add(self.primary_agent_share)?
            .checked_add(self.collaborating_agent_share)
    }
}

/// A deal together with the split persisted for it.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitRecord {
    pub deal: Deal,
    pub commission_amount: Amount,
    pub split: CommissionSplit,
}
