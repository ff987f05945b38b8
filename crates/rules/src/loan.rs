//! Mortgage loan eligibility rules

use crate::config::RulesConfig;
use fidei_core::{MortgageLoanData, RuleDetails, RuleId, RuleOutcome};

/// Price must not exceed `multiplier × annual area minimum wage`
pub fn check_price_cap(data: &MortgageLoanData, config: &RulesConfig) -> RuleOutcome {
    let max_price = data.area_minimum_wage * config.price_wage_multiplier;
    let compliant = data.price <= max_price;

    let message = if compliant {
        format!(
            "Property price ({:.2}) is within {} times the annual minimum wage ({:.2})",
            data.price, config.price_wage_multiplier, max_price
        )
    } else {
        format!(
            "Property price ({:.2}) exceeds {} times the annual minimum wage ({:.2})",
            data.price, config.price_wage_multiplier, max_price
        )
    };

    RuleOutcome::new(
        RuleId::LoanPriceCap,
        compliant,
        message,
        RuleDetails::PriceCap {
            price: data.price,
            max_price,
            multiplier: config.price_wage_multiplier,
        },
    )
}

/// Term in whole years, inclusive range
pub fn check_term_range(data: &MortgageLoanData, config: &RulesConfig) -> RuleOutcome {
    let (min, max) = (config.min_term_years, config.max_term_years);
    let compliant = (min..=max).contains(&data.term_years);

    let message = if compliant {
        format!(
            "Term of {} years is within the allowed range ({}-{} years)",
            data.term_years, min, max
        )
    } else {
        format!(
            "Term of {} years is outside the allowed range ({}-{} years)",
            data.term_years, min, max
        )
    };

    RuleOutcome::new(
        RuleId::LoanTermRange,
        compliant,
        message,
        RuleDetails::TermRange {
            term_years: data.term_years,
            min_years: min,
            max_years: max,
        },
    )
}

pub fn check_guarantee(data: &MortgageLoanData) -> RuleOutcome {
    let message = if data.has_mortgage_guarantee {
        "Loan is backed by a mortgage or fiduciary guarantee"
    } else {
        "Loan requires a mortgage or fiduciary guarantee over the property"
    };

    RuleOutcome::new(
        RuleId::LoanGuarantee,
        data.has_mortgage_guarantee,
        message,
        RuleDetails::Guarantee {
            has_mortgage_guarantee: data.has_mortgage_guarantee,
        },
    )
}

/// Life insurance covering the outstanding balance, and fire insurance
pub fn check_insurance(data: &MortgageLoanData) -> RuleOutcome {
    let mut missing = Vec::new();
    if !data.has_life_insurance {
        missing.push("life insurance covering the outstanding balance".to_string());
    }
    if !data.has_fire_insurance {
        missing.push("fire insurance".to_string());
    }

    let compliant = missing.is_empty();
    let message = if compliant {
        "Loan carries all required insurance".to_string()
    } else {
        format!("Missing required insurance: {}", missing.join(", "))
    };

    RuleOutcome::new(
        RuleId::LoanInsurance,
        compliant,
        message,
        RuleDetails::Insurance {
            has_life_insurance: data.has_life_insurance,
            has_fire_insurance: data.has_fire_insurance,
            missing,
        },
    )
}

/// Interest must not exceed the reference yield rate.
///
/// Without a reference rate the rule cannot be checked; it reports
/// compliant and says so.
pub fn check_interest_rate(data: &MortgageLoanData) -> RuleOutcome {
    let Some(max_rate) = data.max_bond_yield_rate else {
        return RuleOutcome::new(
            RuleId::LoanInterestRate,
            true,
            "Interest rate cap not verified: no reference yield rate provided",
            RuleDetails::InterestRate {
                interest_rate: data.interest_rate,
                max_bond_yield_rate: None,
                note: Some("Provide max_bond_yield_rate to verify this rule".to_string()),
            },
        );
    };

    let exceeds = data.interest_rate > max_rate;
    let message = if exceeds {
        format!(
            "Interest rate ({:.2}%) exceeds the maximum allowed rate ({:.2}%)",
            data.interest_rate, max_rate
        )
    } else {
        "Interest rate is within the allowed limit".to_string()
    };

    RuleOutcome::new(
        RuleId::LoanInterestRate,
        !exceeds,
        message,
        RuleDetails::InterestRate {
            interest_rate: data.interest_rate,
            max_bond_yield_rate: Some(max_rate),
            note: None,
        },
    )
}

/// All loan rules, in a fixed order
pub fn evaluate_loan(data: &MortgageLoanData, config: &RulesConfig) -> Vec<RuleOutcome> {
    vec![
        check_price_cap(data, config),
        check_term_range(data, config),
        check_guarantee(data),
        check_insurance(data),
        check_interest_rate(data),
    ]
}
