use crate::Amount;
use crate::amount::AmountError;
use crate::model::AgentId;

/// Role an agent played on a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Collaborator,
}

/// Commission an agent earned across live deals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEarnings {
    pub agent: AgentId,
    pub deals: u32,
    pub as_primary: Amount,
    pub as_collaborator: Amount,
    total: Amount,
}

impl AgentEarnings {
    pub fn new(agent: AgentId) -> Self {
        Self {
            agent,
            deals: 0,
            as_primary: Amount::ZERO,
            as_collaborator: Amount::ZERO,
            total: Amount::ZERO,
        }
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    /// Leaves the earnings untouched when a total would overflow.
    pub fn credit(&mut self, role: Role, amount: Amount) -> Result<(), AmountError> {
        let total = self.total.checked_add(amount).ok_or(AmountError::Overflow)?;
        let share = self.share_mut(role);
        *share = share.checked_add(amount).ok_or(AmountError::Overflow)?;
        self.total = total;
        self.deals += 1;
        Ok(())
    }

    pub fn debit(&mut self, role: Role, amount: Amount) -> Result<(), AmountError> {
        let total = self.total.checked_sub(amount).ok_or(AmountError::Overflow)?;
        let share = self.share_mut(role);
        *share = share.checked_sub(amount).ok_or(AmountError::Overflow)?;
        self.total = total;
        self.deals = self.deals.saturating_sub(1);
        Ok(())
    }

    fn share_mut(&mut self, role: Role) -> &mut Amount {
        match role {
            Role::Primary => &mut self.as_primary,
            Role::Collaborator => &mut self.as_collaborator,
        }
    }
}
