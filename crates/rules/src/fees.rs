//! Fiduciary fee prerequisite
//!
//! No act may be performed on a trust unless the study fee is paid and
//! every monthly installment in the look-back window is paid. The window is
//! January..=current month of the current year plus every month of the
//! preceding `fee_lookback_years` years.

use crate::config::RulesConfig;
use chrono::{Datelike, NaiveDate};
use fidei_core::{FeeRecord, MissingPayment, RuleDetails, RuleId, RuleOutcome};

/// Months that must be paid as of `today`, newest year first
pub fn required_months(today: NaiveDate, config: &RulesConfig) -> Vec<MissingPayment> {
    let current_year = today.year();
    let oldest_year = current_year - config.fee_lookback_years as i32;

    (oldest_year..=current_year)
        .rev()
        .flat_map(|year| {
            let last_month = if year == current_year { today.month() } else { 12 };
            (1..=last_month).map(move |month| MissingPayment { year, month })
        })
        .collect()
}

pub fn check_fiduciary_fees(
    record: &FeeRecord,
    today: NaiveDate,
    config: &RulesConfig,
) -> RuleOutcome {
    if !record.study_fee_paid {
        return RuleOutcome::new(
            RuleId::FiduciaryFees,
            false,
            format!(
                "Cannot act on the trust: the study and acceptance fee ({:.2}) is unpaid",
                record.study_fee_amount
            ),
            RuleDetails::Fees {
                study_fee_paid: false,
                monthly_fees_up_to_date: false,
                missing_payments: Vec::new(),
            },
        );
    }

    let missing: Vec<MissingPayment> = required_months(today, config)
        .into_iter()
        .filter(|m| !record.is_month_paid(m.year, m.month))
        .collect();

    if !missing.is_empty() {
        return RuleOutcome::new(
            RuleId::FiduciaryFees,
            false,
            format!(
                "Cannot act on the trust: {} monthly fee payment(s) outstanding",
                missing.len()
            ),
            RuleDetails::Fees {
                study_fee_paid: true,
                monthly_fees_up_to_date: false,
                missing_payments: missing,
            },
        );
    }

    RuleOutcome::new(
        RuleId::FiduciaryFees,
        true,
        "All fiduciary fees are paid",
        RuleDetails::Fees {
            study_fee_paid: true,
            monthly_fees_up_to_date: true,
            missing_payments: Vec::new(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fidei_core::MonthlyPayment;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn paid_record(today: NaiveDate) -> FeeRecord {
        let mut record = FeeRecord::new("trust-1", dec!(5000), dec!(18000));
        record.study_fee_paid = true;
        for m in required_months(today, &RulesConfig::default()) {
            record
                .monthly_payments
                .push(MonthlyPayment::paid(m.year, m.month, dec!(1500)).unwrap());
        }
        record
    }

    #[test]
    fn test_window_covers_current_and_prior_year() {
        let months = required_months(date(2026, 3, 15), &RulesConfig::default());
        assert_eq!(months.len(), 3 + 12);
        assert_eq!(months[0], MissingPayment { year: 2026, month: 1 });
        assert_eq!(months[2], MissingPayment { year: 2026, month: 3 });
        assert_eq!(months[3], MissingPayment { year: 2025, month: 1 });
        assert_eq!(months[14], MissingPayment { year: 2025, month: 12 });
    }

    #[test]
    fn test_unpaid_study_fee_blocks() {
        let today = date(2026, 6, 1);
        let mut record = paid_record(today);
        record.study_fee_paid = false;
        let outcome = check_fiduciary_fees(&record, today, &RulesConfig::default());
        assert!(!outcome.compliant);
        assert!(outcome.message.contains("study and acceptance fee"));
    }

    #[test]
    fn test_reports_missing_months() {
        let today = date(2026, 6, 1);
        let mut record = paid_record(today);
        record
            .monthly_payments
            .retain(|p| !(p.year == 2025 && p.month == 7));

        let outcome = check_fiduciary_fees(&record, today, &RulesConfig::default());
        assert!(!outcome.compliant);
        match outcome.details {
            RuleDetails::Fees {
                missing_payments, ..
            } => assert_eq!(missing_payments, vec![MissingPayment { year: 2025, month: 7 }]),
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn test_months_outside_window_are_ignored() {
        let today = date(2026, 2, 10);
        let record = paid_record(today);
        // 2024 and March 2026 onwards were never paid
        let outcome = check_fiduciary_fees(&record, today, &RulesConfig::default());
        assert!(outcome.compliant);
        assert_eq!(outcome.message, "All fiduciary fees are paid");
    }
}
