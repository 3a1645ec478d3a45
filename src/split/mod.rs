//! Commission split calculator.
//!
//! The office always keeps half of a commission. The other half belongs to
//! the agents: on a solo deal the agent takes half of it and the office keeps
//! the rest, on a collaborative deal the two agents share it. Every agent
//! therefore earns a quarter of the pool and only the office share moves
//! (75% solo, 50% collaborative).
//!
//! All arithmetic is decimal with 4 places. Agent shares are rounded and the office
//! share absorbs the residual, so the three shares always add up to the pool.

use crate::model::{CommissionSplit, Deal, SplitRecord};
use crate::amount::AmountError;
use crate::{Amount, Rate};

mod error;
pub use error::{InvalidAmount, SplitError};

/// Allocate `commission_amount` between the office and one or two agents.
pub fn split_commission(
    commission_amount: Amount,
    has_collaborating_agent: bool,
) -> Result<CommissionSplit, SplitError> {
    if commission_amount.is_negative() {
        return Err(InvalidAmount::Negative(commission_amount).into());
    }

    // half of the remaining (non-office) half
    let agent_share = commission_amount
        .mul_rate(Rate::QUARTER)
        .map_err(InvalidAmount::from)?;
    let collaborating_agent_share = if has_collaborating_agent {
        agent_share
    } else {
        Amount::ZERO
    };
    let office_share = commission_amount
        .checked_sub(agent_share)
        .and_then(|rest| rest.checked_sub(collaborating_agent_share))
        .ok_or(InvalidAmount::Unrepresentable(AmountError::Overflow))?;

    Ok(CommissionSplit {
        office_share,
        primary_agent_share: agent_share,
        collaborating_agent_share,
    })
}

/// Same as [`split_commission`], but on a collaborative deal the agents'
/// combined share is divided by `split_ratio` (the primary agent's fraction)
/// instead of evenly. The office share is unchanged; on solo deals the ratio
/// has no effect.
pub fn split_commission_weighted(
    commission_amount: Amount,
    has_collaborating_agent: bool,
    split_ratio: Rate,
) -> Result<CommissionSplit, SplitError> {
    let even = split_commission(commission_amount, has_collaborating_agent)?;
    if !has_collaborating_agent {
        return Ok(even);
    }

    let overflow = || InvalidAmount::Unrepresentable(AmountError::Overflow);
    let pool = even
        .primary_agent_share
        .checked_add(even.collaborating_agent_share)
        .ok_or_else(overflow)?;
    let primary_agent_share = pool.mul_rate(split_ratio).map_err(InvalidAmount::from)?;
    Ok(CommissionSplit {
        office_share: even.office_share,
        primary_agent_share,
        collaborating_agent_share: pool.checked_sub(primary_agent_share).ok_or_else(overflow)?,
    })
}

/// Float entry point for callers that hold binary floating point amounts.
///
/// Non-finite values are rejected like negative ones.
pub fn split_commission_f64(
    commission_amount: f64,
    has_collaborating_agent: bool,
) -> Result<CommissionSplit, SplitError> {
    let amount = Amount::try_from_float(commission_amount).map_err(InvalidAmount::from)?;
    split_commission(amount, has_collaborating_agent)
}

/// Validate a deal, derive its commission pool and allocate it.
///
/// This is the single computation behind both a persisted split and a
/// pre-submission preview.
pub fn split_deal(deal: Deal) -> Result<SplitRecord, SplitError> {
    if deal.gross_amount.is_negative() {
        return Err(SplitError::NegativeGross {
            tx: deal.tx,
            amount: deal.gross_amount,
        });
    }

    let commission_amount = deal.commission_amount().map_err(InvalidAmount::from)?;
    let has_collaborating_agent = deal.has_collaborating_agent();
    let split = match deal.split_ratio {
        Some(ratio) => split_commission_weighted(commission_amount, has_collaborating_agent, ratio)?,
        None => split_commission(commission_amount, has_collaborating_agent)?,
    };

    Ok(SplitRecord {
        deal,
        commission_amount,
        split,
    })
}
