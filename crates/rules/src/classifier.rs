//! Compliance classifier
//!
//! Failing rules are ranked and the most severe wins:
//! `Clear < Reviewable < Blocking`
//!
//! - limit breaches alone are `Reviewable` (exception governance may clear them)
//! - any loan eligibility failure is `Blocking`
//! - anything else that fails is `Blocking`

use fidei_core::{ComplianceStatus, RuleFamily, RuleOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Clear,
    Reviewable,
    Blocking,
}

impl Severity {
    fn of(outcome: &RuleOutcome) -> Severity {
        if outcome.compliant {
            return Severity::Clear;
        }
        match outcome.family() {
            RuleFamily::InvestmentLimit => Severity::Reviewable,
            RuleFamily::LoanEligibility | RuleFamily::FeePrerequisite => Severity::Blocking,
        }
    }

    pub fn status(&self) -> ComplianceStatus {
        match self {
            Severity::Clear => ComplianceStatus::Compliant,
            Severity::Reviewable => ComplianceStatus::PendingReview,
            Severity::Blocking => ComplianceStatus::NonCompliant,
        }
    }
}

/// Aggregate rule outcomes into a single status
pub fn classify<'a>(outcomes: impl IntoIterator<Item = &'a RuleOutcome>) -> ComplianceStatus {
    outcomes
        .into_iter()
        .map(Severity::of)
        .max()
        .unwrap_or(Severity::Clear)
        .status()
}
