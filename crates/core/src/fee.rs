//! Fiduciary fee bookkeeping

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One monthly installment of the annual management fee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPayment {
    pub year: i32,
    pub month: u32,
    pub amount: Decimal,
    pub paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
}

impl MonthlyPayment {
    pub fn paid(year: i32, month: u32, amount: Decimal) -> CoreResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidMonth(month));
        }
        Ok(Self {
            year,
            month,
            amount,
            paid: true,
            paid_at: Some(Utc::now()),
        })
    }
}

/// Fee record of a trust: the one-off study fee plus monthly installments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRecord {
    pub trust_id: String,
    pub study_fee_amount: Decimal,
    pub study_fee_paid: bool,
    pub annual_fee: Decimal,
    pub monthly_payments: Vec<MonthlyPayment>,
}

impl FeeRecord {
    pub fn new(trust_id: impl Into<String>, study_fee_amount: Decimal, annual_fee: Decimal) -> Self {
        Self {
            trust_id: trust_id.into(),
            study_fee_amount,
            study_fee_paid: false,
            annual_fee,
            monthly_payments: Vec::new(),
        }
    }

    /// Proportional share of the annual fee due each month
    pub fn monthly_installment(&self) -> Decimal {
        (self.annual_fee / Decimal::from(12)).round_dp(2)
    }

    pub fn is_month_paid(&self, year: i32, month: u32) -> bool {
        self.monthly_payments
            .iter()
            .any(|p| p.year == year && p.month == month && p.paid)
    }
}
