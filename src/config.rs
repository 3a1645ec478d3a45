//! Business-configured commission rates.

use std::env;

use thiserror::Error;
use tracing::info;

use crate::Rate;
use crate::amount::AmountError;
use crate::model::DealType;

pub const SALE_RATE_VAR: &str = "COMMISSION_RATE_SALE";
pub const RENT_RATE_VAR: &str = "COMMISSION_RATE_RENT";

const DEFAULT_SALE_RATE: Rate = Rate::from_bps(300);
const DEFAULT_RENT_RATE: Rate = Rate::HALF;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key} value: {source}")]
    InvalidRate { key: &'static str, source: AmountError },
}

/// Default commission rate per deal type, applied when an input row does not
/// carry its own rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub sale_rate: Rate,
    pub rent_rate: Rate,
}

impl Config {
    /// Load from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            sale_rate: try_load(&lookup, SALE_RATE_VAR, DEFAULT_SALE_RATE)?,
            rent_rate: try_load(&lookup, RENT_RATE_VAR, DEFAULT_RENT_RATE)?,
        })
    }

    pub fn rate_for(&self, deal_type: DealType) -> Rate {
        match deal_type {
            DealType::Sale => self.sale_rate,
            DealType::Rent => self.rent_rate,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sale_rate: DEFAULT_SALE_RATE,
            rent_rate: DEFAULT_RENT_RATE,
        }
    }
}

fn try_load(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Rate,
) -> Result<Rate, ConfigError> {
    let Some(value) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return Ok(default);
    };
    value
        .parse()
        .map_err(|source| ConfigError::InvalidRate { key, source })
}
