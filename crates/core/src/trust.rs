//! Irrevocable trusts and their concentration limits

use crate::amount::Amount;
use crate::asset::AssetClass;
use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Concentration limits as percentages of initial capital.
///
/// `None` means the trust type carries no explicit limit for that class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrustLimits {
    pub bond_limit_percent: Option<Decimal>,
    pub other_limit_percent: Option<Decimal>,
}

impl TrustLimits {
    pub fn new(bond: Option<Decimal>, other: Option<Decimal>) -> CoreResult<Self> {
        let limits = Self {
            bond_limit_percent: bond,
            other_limit_percent: other,
        };
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> CoreResult<()> {
        for (name, value) in [
            ("bond_limit_percent", self.bond_limit_percent),
            ("other_limit_percent", self.other_limit_percent),
        ] {
            if let Some(value) = value {
                if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
                    return Err(CoreError::LimitOutOfRange { name, value });
                }
            }
        }

        if let (Some(bond), Some(other)) = (self.bond_limit_percent, self.other_limit_percent) {
            let total = bond + other;
            if total > Decimal::ONE_HUNDRED {
                return Err(CoreError::LimitsExceedCapital(total));
            }
        }

        Ok(())
    }

    pub fn for_class(&self, class: AssetClass) -> Option<Decimal> {
        match class {
            AssetClass::Bond => self.bond_limit_percent,
            AssetClass::Other => self.other_limit_percent,
        }
    }
}

/// An irrevocable trust (fideicomiso)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trust {
    pub id: String,
    pub name: String,
    pub initial_capital: Amount,
    pub limits: TrustLimits,
    /// Exceptions are resolved by committee majority instead of one approver
    pub requires_consensus: bool,
    pub created_at: DateTime<Utc>,
}

impl Trust {
    /// Build a trust, enforcing capital and limit invariants
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        initial_capital: Decimal,
        limits: TrustLimits,
        requires_consensus: bool,
    ) -> CoreResult<Self> {
        let initial_capital = Amount::new(initial_capital)
            .map_err(|_| CoreError::NonPositiveCapital(initial_capital))?;
        limits.validate()?;

        Ok(Self {
            id: id.into(),
            name: name.into(),
            initial_capital,
            limits,
            requires_consensus,
            created_at: Utc::now(),
        })
    }
}
