//! Rule engine - picks the rules that apply to an asset and classifies it

use crate::classifier::classify;
use crate::config::RulesConfig;
use crate::fees::check_fiduciary_fees;
use crate::investment::{evaluate_investment, Holding, InvestmentContext};
use crate::loan::evaluate_loan;
use chrono::NaiveDate;
use fidei_core::{
    Amount, AssetType, ComplianceStatus, FeeRecord, MortgageLoanData, RuleOutcome, Trust,
    ValidationRecord,
};

/// Asset being registered
#[derive(Debug, Clone, Copy)]
pub struct AssetCandidate<'a> {
    pub asset_type: AssetType,
    pub value: Amount,
    pub loan: Option<&'a MortgageLoanData>,
}

/// Result of evaluating one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub investment: Vec<RuleOutcome>,
    pub loan: Vec<RuleOutcome>,
    pub status: ComplianceStatus,
}

impl Evaluation {
    pub fn is_compliant(&self) -> bool {
        self.status.is_compliant()
    }

    /// Validation record to persist, with the fee outcome as prerequisite
    pub fn into_record(self, fee_outcome: RuleOutcome) -> ValidationRecord {
        ValidationRecord {
            prerequisites: vec![fee_outcome],
            investment: self.investment,
            loan: self.loan,
            resolution: None,
        }
    }
}

/// Stateless evaluator over a [`RulesConfig`]
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    config: RulesConfig,
}

impl RuleEngine {
    pub fn new(config: RulesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Fee prerequisite as of `today`
    pub fn check_fees(&self, record: &FeeRecord, today: NaiveDate) -> RuleOutcome {
        check_fiduciary_fees(record, today, &self.config)
    }

    /// Concentration rules against `existing`, loan rules for mortgage loans
    /// carrying loan data, then classification.
    pub fn evaluate(
        &self,
        trust: &Trust,
        existing: &[Holding],
        candidate: &AssetCandidate<'_>,
    ) -> Evaluation {
        let ctx = InvestmentContext {
            initial_capital: trust.initial_capital,
            limits: trust.limits,
            existing,
            new_asset: Holding::new(candidate.asset_type, candidate.value.value()),
        };
        let investment = evaluate_investment(&ctx, &self.config);

        let loan = match candidate.loan {
            Some(data) if candidate.asset_type.is_mortgage_loan() => {
                evaluate_loan(data, &self.config)
            }
            _ => Vec::new(),
        };

        let status = classify(investment.iter().chain(loan.iter()));

        tracing::debug!(
            trust_id = %trust.id,
            asset_type = %candidate.asset_type,
            status = %status,
            rules = investment.len() + loan.len(),
            "Asset evaluated"
        );

        Evaluation {
            investment,
            loan,
            status,
        }
    }
}
