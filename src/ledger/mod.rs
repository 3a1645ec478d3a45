//! Commission ledger.
//!
//! The ledger records closed deals together with their commission split and
//! keeps running totals for the office and every agent. Splits are computed
//! once when a deal closes and recomputed only when its financial fields are
//! amended. Also supports async stream of events.

use std::collections::{HashMap, HashSet};

use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::amount::AmountError;
use crate::model::{AgentId, Deal, Event, SplitRecord, TxId};
use crate::split::split_deal;
use crate::{Amount, Rate};

mod state;
pub use state::{AgentEarnings, Role};

mod error;
pub use error::{CloseError, LedgerError, RecordOperation, RecordOperationError};

/// Books closed deals and the commission they pay out.
pub struct Ledger {
    records: HashMap<TxId, SplitRecord>,
    agents: HashMap<AgentId, AgentEarnings>,
    office: Amount,
    commission: Amount,
    /// Ids of cancelled deals, kept so they are never reused
    cancelled: HashSet<TxId>,
}

/// Public API
impl Ledger {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            agents: HashMap::new(),
            office: Amount::ZERO,
            commission: Amount::ZERO,
            cancelled: HashSet::new(),
        }
    }

    /// Run the ledger with the given event stream
    pub async fn run(&mut self, mut stream: impl Stream<Item = Event> + Unpin) {
        while let Some(event) = stream.next().await {
            // a rejected event never stops the ledger; it is logged in `apply`
            let _ = self.apply(event);
        }
    }

    /// Live split records, in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &SplitRecord> + '_ {
        self.records.values()
    }

    pub fn get_record(&self, tx: TxId) -> Option<&SplitRecord> {
        self.records.get(&tx)
    }

    /// Agent earnings, in no particular order.
    pub fn agents(&self) -> impl Iterator<Item = &AgentEarnings> + '_ {
        self.agents.values()
    }

    pub fn get_agent(&self, agent: AgentId) -> Option<&AgentEarnings> {
        self.agents.get(&agent)
    }

    /// Office share summed over live records.
    pub fn office_total(&self) -> Amount {
        self.office
    }

    /// Commission pool summed over live records.
    pub fn commission_total(&self) -> Amount {
        self.commission
    }

    /// Apply a single event on top of the current ledger state
    pub fn apply(&mut self, event: Event) -> Result<(), LedgerError> {
        match event {
            Event::Close(deal) => {
                let tx = deal.tx;
                let result = self.apply_close(deal);
                Self::log_result("close", tx, &result);
                result?;
            }
            Event::Amend {
                tx,
                gross_amount,
                commission_rate,
            } => {
                let result = self.apply_amend(tx, gross_amount, commission_rate);
                Self::log_result("amend", tx, &result);
                result?;
            }
            Event::Cancel { tx } => {
                let result = self.apply_cancel(tx);
                Self::log_result("cancel", tx, &result);
                result?;
            }
        }
        Ok(())
    }
}

/// Private API
impl Ledger {
    /// Small helper to log `apply` results. Successful operations report the
    /// commission pool now booked for the deal.
    fn log_result<E: std::fmt::Display>(
        event_type: &str,
        tx: TxId,
        result: &Result<Option<Amount>, E>,
    ) {
        match result {
            Ok(Some(commission)) => {
                info!(tx = %tx, commission = %commission, "{event_type} applied");
            }
            Ok(None) => {
                info!(tx = %tx, "{event_type} applied");
            }
            Err(e) => {
                info!(tx = %tx, reason = %e, "{event_type} skipped");
            }
        }
    }

    /// Ensure transaction ID was never used, cancelled deals included
    fn is_unique(&self, tx: &TxId) -> bool {
        !self.records.contains_key(tx) && !self.cancelled.contains(tx)
    }

    /// Apply an `Event::Close`:
    /// - Ensure transaction ID is unique
    /// - Ensure the collaborator is a different agent
    /// - Compute the split and book it
    fn apply_close(&mut self, deal: Deal) -> Result<Option<Amount>, CloseError> {
        if !self.is_unique(&deal.tx) {
            return Err(CloseError::DuplicateTxId(deal.tx));
        }
        if deal.collaborating_agent == Some(deal.primary_agent) {
            return Err(CloseError::SameAgent(deal.tx, deal.primary_agent));
        }

        let record = split_deal(deal)?;
        let commission = record.commission_amount;
        if commission == Amount::ZERO {
            warn!(tx = record.deal.tx, "deal closed with zero commission");
        }

        let totals = self
            .stage(None, Some(&record))
            .map_err(|_| CloseError::Overflow(record.deal.tx))?;
        self.commit(totals);
        self.records.insert(record.deal.tx, record);

        Ok(Some(commission))
    }

    /// Apply an `Event::Amend`:
    /// - Find the referenced record
    /// - Recompute the split with the new financial fields
    /// - Swap the old allocation for the new one
    ///
    /// The record is left untouched when recomputing or rebooking fails.
    fn apply_amend(
        &mut self,
        tx: TxId,
        gross_amount: Option<Amount>,
        commission_rate: Option<Rate>,
    ) -> Result<Option<Amount>, RecordOperationError> {
        use RecordOperation::Amend;

        let previous = self.find(Amend, tx)?;
        if gross_amount.is_none() && commission_rate.is_none() {
            return Err(RecordOperationError::NothingToAmend(tx));
        }

        let mut deal = previous.deal.clone();
        if let Some(gross_amount) = gross_amount {
            deal.gross_amount = gross_amount;
        }
        if let Some(commission_rate) = commission_rate {
            deal.commission_rate = commission_rate;
        }
        let record = split_deal(deal).map_err(|e| RecordOperationError::Recompute(tx, e))?;

        let totals = self
            .stage(Some(previous), Some(&record))
            .map_err(|_| RecordOperationError::Overflow(Amend, tx))?;
        self.commit(totals);
        let commission = record.commission_amount;
        self.records.insert(tx, record);

        Ok(Some(commission))
    }

    /// Apply an `Event::Cancel`:
    /// - Find the referenced record
    /// - Reverse its allocation
    /// - Evict it and remember the id (terminal state)
    fn apply_cancel(&mut self, tx: TxId) -> Result<Option<Amount>, RecordOperationError> {
        use RecordOperation::Cancel;

        let record = self.find(Cancel, tx)?;
        let totals = self
            .stage(Some(record), None)
            .map_err(|_| RecordOperationError::Overflow(Cancel, tx))?;
        self.commit(totals);
        self.records.remove(&tx);
        self.cancelled.insert(tx);

        Ok(None)
    }

    fn find(
        &self,
        operation: RecordOperation,
        tx: TxId,
    ) -> Result<&SplitRecord, RecordOperationError> {
        if self.cancelled.contains(&tx) {
            return Err(RecordOperationError::Cancelled(operation, tx));
        }
        self.records
            .get(&tx)
            .ok_or(RecordOperationError::TxNotFound(operation, tx))
    }

    /// Compute the totals that result from swapping the allocation of
    /// `removed` for the one of `added`, without touching the books.
    fn stage(
        &self,
        removed: Option<&SplitRecord>,
        added: Option<&SplitRecord>,
    ) -> Result<Totals, AmountError> {
        let mut totals = Totals {
            office: self.office,
            commission: self.commission,
            agents: HashMap::new(),
        };

        if let Some(record) = removed {
            totals.office = checked(totals.office.checked_sub(record.split.office_share))?;
            totals.commission = checked(totals.commission.checked_sub(record.commission_amount))?;
            for (agent, role, share) in allocations(record) {
                self.staged_agent(&mut totals.agents, agent)
                    .debit(role, share)?;
            }
        }
        if let Some(record) = added {
            totals.office = checked(totals.office.checked_add(record.split.office_share))?;
            totals.commission = checked(totals.commission.checked_add(record.commission_amount))?;
            for (agent, role, share) in allocations(record) {
                self.staged_agent(&mut totals.agents, agent)
                    .credit(role, share)?;
            }
        }

        Ok(totals)
    }

    fn staged_agent<'a>(
        &self,
        staged: &'a mut HashMap<AgentId, AgentEarnings>,
        agent: AgentId,
    ) -> &'a mut AgentEarnings {
        staged.entry(agent).or_insert_with(|| {
            self.agents
                .get(&agent)
                .cloned()
                .unwrap_or_else(|| AgentEarnings::new(agent))
        })
    }

    /// Agents left without any live deal are dropped
    fn commit(&mut self, totals: Totals) {
        self.office = totals.office;
        self.commission = totals.commission;
        for (agent, earnings) in totals.agents {
            if earnings.deals == 0 {
                self.agents.remove(&agent);
            } else {
                self.agents.insert(agent, earnings);
            }
        }
    }
}

/// Ledger totals staged for a single event.
struct Totals {
    office: Amount,
    commission: Amount,
    /// Only the agents the event touches
    agents: HashMap<AgentId, AgentEarnings>,
}

fn checked(amount: Option<Amount>) -> Result<Amount, AmountError> {
    amount.ok_or(AmountError::Overflow)
}

/// Agent shares of a record, primary first.
fn allocations(record: &SplitRecord) -> impl Iterator<Item = (AgentId, Role, Amount)> {
    let primary = (
        record.deal.primary_agent,
        Role::Primary,
        record.split.primary_agent_share,
    );
    let collaborator = record
        .deal
        .collaborating_agent
        .map(|agent| (agent, Role::Collaborator, record.split.collaborating_agent_share));
    std::iter::once(primary).chain(collaborator)
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
