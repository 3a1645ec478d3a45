use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

const DECIMALS: u32 = 4;

/// Errors raised when building an [`Amount`] or a [`Rate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("'{0}' is not a valid decimal number")]
    Parse(String),

    #[error("'{0}' has more than 4 decimal places")]
    Precision(String),

    #[error("value is not a finite number")]
    NonFinite,

    #[error("{0} is out of range")]
    OutOfRange(String),

    #[error("arithmetic overflow")]
    Overflow,
}

/// Currency amount with at most 4 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);
    pub const MAX: Amount = Amount(Decimal::MAX);

    /// Build from a count of 1/10_000ths.
    pub fn from_scaled(value: i64) -> Self {
        Amount(Decimal::new(value, DECIMALS))
    }

    pub fn try_from_decimal(value: Decimal) -> Result<Self, AmountError> {
        if value.normalize().scale() > DECIMALS {
            return Err(AmountError::Precision(value.to_string()));
        }
        Ok(Amount(value))
    }

    /// Convert a binary float, rounding to the nearest 1/10_000th.
    pub fn try_from_float(value: f64) -> Result<Self, AmountError> {
        if !value.is_finite() {
            return Err(AmountError::NonFinite);
        }
        let exact = Decimal::from_f64_retain(value)
            .ok_or_else(|| AmountError::OutOfRange(value.to_string()))?;
        Ok(Amount(round(exact)))
    }

    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Multiply by a rate, rounding half away from zero.
    pub fn mul_rate(self, rate: Rate) -> Result<Amount, AmountError> {
        self.0
            .checked_mul(rate.0)
            .map(|product| Amount(round(product)))
            .ok_or(AmountError::Overflow)
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// A fraction in `[0, 1]` with the same 4 decimal places as [`Amount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);
    pub const QUARTER: Rate = Rate::from_bps(2_500);
    pub const HALF: Rate = Rate::from_bps(5_000);
    pub const ONE: Rate = Rate(Decimal::ONE);

    /// Const constructor from basis points of 1/10_000th; a value above
    /// 10_000 fails the build when used in a const item.
    pub const fn from_bps(bps: u32) -> Self {
        assert!(bps <= 10_000, "rate out of range");
        Rate(Decimal::from_parts(bps, 0, 0, false, DECIMALS))
    }

    pub fn try_from_decimal(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(AmountError::OutOfRange(format!(
                "rate {}",
                value.normalize()
            )));
        }
        Amount::try_from_decimal(value).map(|amount| Rate(amount.0))
    }

    pub fn try_from_float(value: f64) -> Result<Self, AmountError> {
        let amount = Amount::try_from_float(value)?;
        Rate::try_from_decimal(amount.0)
    }
}

impl FromStr for Rate {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rate::try_from_decimal(parse_decimal(s)?)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a plain decimal string (`"-12.5"`, `"7500"`) without going through
/// binary floating point.
fn parse_decimal(input: &str) -> Result<Decimal, AmountError> {
    let s = input.trim();
    let value = Decimal::from_str_exact(s).map_err(|e| match e {
        rust_decimal::Error::ExceedsMaximumPossibleValue
        | rust_decimal::Error::LessThanMinimumPossibleValue => {
            AmountError::OutOfRange(s.to_string())
        }
        _ => AmountError::Parse(s.to_string()),
    })?;
    if value.normalize().scale() > DECIMALS {
        return Err(AmountError::Precision(s.to_string()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_scaled_counts_ten_thousandths() {
        assert_eq!(Amount::from_scaled(123456).to_string(), "12.3456");
        assert_eq!(Amount::from_scaled(-1).to_string(), "-0.0001");
    }

    #[test]
    fn try_from_float_converts_and_rounds() {
        assert_eq!(Amount::try_from_float(100.0), Ok(Amount::from_scaled(1_000_000)));
        assert_eq!(Amount::try_from_float(0.0001), Ok(Amount::from_scaled(1)));
        assert_eq!(Amount::try_from_float(1.23456), Ok(Amount::from_scaled(12346)));
        assert_eq!(Amount::try_from_float(-50.25), Ok(Amount::from_scaled(-502_500)));
    }

    #[test]
    fn try_from_float_keeps_large_values_exact() {
        // 2^63 sits just past i64::MAX and must not saturate
        let amount = Amount::try_from_float(9_223_372_036_854_775_808.0).unwrap();
        assert_eq!(amount.to_string(), "9223372036854775808");
        let amount = Amount::try_from_float(-9_223_372_036_854_775_808.0).unwrap();
        assert_eq!(amount.to_string(), "-9223372036854775808");
    }

    #[test]
    fn try_from_float_rejects_non_finite() {
        assert_eq!(Amount::try_from_float(f64::NAN), Err(AmountError::NonFinite));
        assert_eq!(Amount::try_from_float(f64::INFINITY), Err(AmountError::NonFinite));
        assert!(matches!(
            Amount::try_from_float(1e300),
            Err(AmountError::OutOfRange(_))
        ));
    }

    #[test]
    fn parse_decimal_strings() {
        assert_eq!("7500".parse(), Ok(Amount::from_scaled(75_000_000)));
        assert_eq!("187.5".parse(), Ok(Amount::from_scaled(1_875_000)));
        assert_eq!(" 0.03 ".parse(), Ok(Amount::from_scaled(300)));
        assert_eq!("-100".parse(), Ok(Amount::from_scaled(-1_000_000)));
        assert_eq!("1.50000".parse(), Ok(Amount::from_scaled(15_000)));
        assert_eq!(
            "99999999999999999999".parse::<Amount>().unwrap().to_string(),
            "99999999999999999999"
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!("".parse::<Amount>(), Err(AmountError::Parse(_))));
        assert!(matches!("1e5".parse::<Amount>(), Err(AmountError::Parse(_))));
        assert!(matches!("1.2.3".parse::<Amount>(), Err(AmountError::Parse(_))));
        assert!(matches!("12abc".parse::<Amount>(), Err(AmountError::Parse(_))));
        assert!(matches!(
            "0.00001".parse::<Amount>(),
            Err(AmountError::Precision(_))
        ));
        assert!("999999999999999999999999999999999".parse::<Amount>().is_err());
    }

    #[test]
    fn display_trims_trailing_zeros() {
        assert_eq!(Amount::from_scaled(56_250_000).to_string(), "5625");
        assert_eq!(Amount::from_scaled(1_875_000).to_string(), "187.5");
        assert_eq!(Amount::from_scaled(1).to_string(), "0.0001");
        assert_eq!(Amount::from_scaled(0).to_string(), "0");
        assert_eq!(Amount::from_scaled(-502_500).to_string(), "-50.25");
        assert_eq!("250000".parse::<Amount>().unwrap().to_string(), "250000");
    }

    #[test]
    fn mul_rate_rounds_half_away_from_zero() {
        assert_eq!(
            Amount::from_scaled(75_000_000).mul_rate(Rate::QUARTER),
            Ok(Amount::from_scaled(18_750_000))
        );
        // 0.0002 * 0.25 = 0.00005 -> 0.0001
        assert_eq!(
            Amount::from_scaled(2).mul_rate(Rate::QUARTER),
            Ok(Amount::from_scaled(1))
        );
        // 0.0001 * 0.25 = 0.000025 -> 0
        assert_eq!(Amount::from_scaled(1).mul_rate(Rate::QUARTER), Ok(Amount::ZERO));
        assert_eq!(
            Amount::from_scaled(-2).mul_rate(Rate::QUARTER),
            Ok(Amount::from_scaled(-1))
        );
    }

    #[test]
    fn mul_rate_on_the_largest_amount() {
        assert_eq!(Amount::MAX.mul_rate(Rate::ONE), Ok(Amount::MAX));
        assert_eq!(Amount::MAX.mul_rate(Rate::ZERO), Ok(Amount::ZERO));
        assert!(Amount::MAX.mul_rate(Rate::QUARTER).unwrap() < Amount::MAX);
    }

    #[test]
    fn checked_arithmetic() {
        let a = Amount::from_scaled(100);
        assert_eq!(a.checked_add(Amount::from_scaled(50)), Some(Amount::from_scaled(150)));
        assert_eq!(a.checked_sub(Amount::from_scaled(30)), Some(Amount::from_scaled(70)));
        assert_eq!(Amount::MAX.checked_add(Amount::from_scaled(10_000)), None);
        assert_eq!(Amount::ZERO.checked_sub(Amount::MAX).map(Amount::is_negative), Some(true));
        assert!(Amount::from_scaled(-1).is_negative());
        assert!(!Amount::ZERO.is_negative());
    }

    #[test]
    fn rate_bounds() {
        assert_eq!("0.5".parse(), Ok(Rate::HALF));
        assert_eq!("0.25".parse(), Ok(Rate::QUARTER));
        assert_eq!("1".parse(), Ok(Rate::ONE));
        assert!(matches!("1.01".parse::<Rate>(), Err(AmountError::OutOfRange(_))));
        assert!(matches!("-0.1".parse::<Rate>(), Err(AmountError::OutOfRange(_))));
        assert!(matches!("0.00005".parse::<Rate>(), Err(AmountError::Precision(_))));
        assert_eq!(Rate::try_from_float(0.03), Ok(Rate::from_bps(300)));
        assert_eq!(Rate::from_bps(300).to_string(), "0.03");
    }

    #[test]
    fn rate_error_message_is_readable() {
        let err = Rate::try_from_decimal(Decimal::new(15, 1)).unwrap_err();
        assert_eq!(err.to_string(), "rate 1.5 is out of range");
    }
}
