//! Amount - positive decimal wrapper for asset values in MXN
//!
//! Registered asset values MUST be strictly positive.
//! This is enforced at the type level.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when building an amount
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount must be positive: {0}")]
    NotPositive(Decimal),
}

/// A strictly positive decimal amount.
///
/// # Invariant
/// The inner value is always > 0. This is enforced by the constructor.
///
/// # Example
/// ```
/// use fidei_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(250_000, 0)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(250_000, 0));
///
/// assert!(Amount::new(Decimal::ZERO).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Create a new Amount, rejecting zero and negative values.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            Err(AmountError::NotPositive(value))
        } else {
            Ok(Self(value))
        }
    }

    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// `percent` of this amount, e.g. the MXN ceiling of a 30% limit
    pub fn percent(&self, percent: Decimal) -> Decimal {
        self.0 * percent / Decimal::ONE_HUNDRED
    }

    /// Share of this amount represented by `part`, as a percentage
    pub fn share_of(&self, part: Decimal) -> Decimal {
        part.checked_div(self.0)
            .map(|ratio| ratio * Decimal::ONE_HUNDRED)
            .unwrap_or(Decimal::ZERO)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rejects_zero_and_negative() {
        assert!(Amount::new(dec!(0)).is_err());
        assert!(Amount::new(dec!(-1)).is_err());
        assert!(Amount::new(dec!(0.01)).is_ok());
    }

    #[test]
    fn test_percent_and_share() {
        let capital = Amount::new(dec!(1000000)).unwrap();
        assert_eq!(capital.percent(dec!(30)), dec!(300000));
        assert_eq!(capital.share_of(dec!(250000)), dec!(25));
    }

    #[test]
    fn test_serde_rejects_non_positive() {
        let parsed: Result<Amount, _> = serde_json::from_str("\"-5\"");
        assert!(parsed.is_err());
        let ok: Amount = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(ok.value(), dec!(12.5));
    }
}
