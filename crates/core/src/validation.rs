//! Typed rule outcomes and the validation record stored with each asset

use crate::actor::ActorRef;
use crate::status::ComplianceStatus;
use crate::vote::VoteChoice;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rule family, which drives classification precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleFamily {
    InvestmentLimit,
    LoanEligibility,
    FeePrerequisite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleId {
    BondLimit,
    OtherAssetsLimit,
    LoanPriceCap,
    LoanTermRange,
    LoanGuarantee,
    LoanInsurance,
    LoanInterestRate,
    FiduciaryFees,
}

impl RuleId {
    pub fn family(&self) -> RuleFamily {
        match self {
            RuleId::BondLimit | RuleId::OtherAssetsLimit => RuleFamily::InvestmentLimit,
            RuleId::FiduciaryFees => RuleFamily::FeePrerequisite,
            _ => RuleFamily::LoanEligibility,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RuleId::BondLimit => "BOND_LIMIT",
            RuleId::OtherAssetsLimit => "OTHER_ASSETS_LIMIT",
            RuleId::LoanPriceCap => "LOAN_PRICE_CAP",
            RuleId::LoanTermRange => "LOAN_TERM_RANGE",
            RuleId::LoanGuarantee => "LOAN_GUARANTEE",
            RuleId::LoanInsurance => "LOAN_INSURANCE",
            RuleId::LoanInterestRate => "LOAN_INTEREST_RATE",
            RuleId::FiduciaryFees => "FIDUCIARY_FEES",
        }
    }
}

/// Month with an outstanding fee installment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingPayment {
    pub year: i32,
    pub month: u32,
}

/// Rule-specific evidence, one variant per rule kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleDetails {
    Concentration {
        current_percent: Decimal,
        limit_percent: Decimal,
        total_invested: Decimal,
        limit_amount: Decimal,
    },
    PriceCap {
        price: Decimal,
        max_price: Decimal,
        multiplier: Decimal,
    },
    TermRange {
        term_years: u32,
        min_years: u32,
        max_years: u32,
    },
    Guarantee {
        has_mortgage_guarantee: bool,
    },
    Insurance {
        has_life_insurance: bool,
        has_fire_insurance: bool,
        missing: Vec<String>,
    },
    InterestRate {
        interest_rate: Decimal,
        max_bond_yield_rate: Option<Decimal>,
        note: Option<String>,
    },
    Fees {
        study_fee_paid: bool,
        monthly_fees_up_to_date: bool,
        missing_payments: Vec<MissingPayment>,
    },
}

/// Outcome of one rule evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: RuleId,
    pub compliant: bool,
    pub status: ComplianceStatus,
    pub message: String,
    pub details: RuleDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl RuleOutcome {
    pub fn new(rule: RuleId, compliant: bool, message: impl Into<String>, details: RuleDetails) -> Self {
        Self {
            rule,
            compliant,
            status: if compliant {
                ComplianceStatus::Compliant
            } else {
                ComplianceStatus::NonCompliant
            },
            message: message.into(),
            details,
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn family(&self) -> RuleFamily {
        self.rule.family()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionDecision {
    Approved,
    Rejected,
}

/// One line of the vote roster kept with a consensus resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRosterEntry {
    pub voter_id: String,
    pub choice: VoteChoice,
    pub reason: String,
    pub voted_at: DateTime<Utc>,
}

/// Annotation written when an asset leaves PENDING_REVIEW
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionResolution {
    pub decision: ResolutionDecision,
    pub decided_by: ActorRef,
    pub decided_at: DateTime<Utc>,
    pub reason: String,
    pub by_consensus: bool,
    #[serde(default)]
    pub votes: Vec<VoteRosterEntry>,
}

impl ExceptionResolution {
    /// Decision taken by a single committee member
    pub fn single(decision: ResolutionDecision, decided_by: ActorRef, reason: impl Into<String>) -> Self {
        Self {
            decision,
            decided_by,
            decided_at: Utc::now(),
            reason: reason.into(),
            by_consensus: false,
            votes: Vec::new(),
        }
    }

    /// Decision reached by committee majority, credited to the deciding vote
    pub fn consensus(
        decision: ResolutionDecision,
        decided_by: ActorRef,
        reason: impl Into<String>,
        votes: Vec<VoteRosterEntry>,
    ) -> Self {
        Self {
            decision,
            decided_by,
            decided_at: Utc::now(),
            reason: reason.into(),
            by_consensus: true,
            votes,
        }
    }
}

/// Everything the rule engine said about an asset, plus its resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    #[serde(default)]
    pub prerequisites: Vec<RuleOutcome>,
    #[serde(default)]
    pub investment: Vec<RuleOutcome>,
    #[serde(default)]
    pub loan: Vec<RuleOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ExceptionResolution>,
}

impl ValidationRecord {
    pub fn outcomes(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.prerequisites
            .iter()
            .chain(self.investment.iter())
            .chain(self.loan.iter())
    }

    pub fn failing(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes().filter(|o| !o.compliant)
    }

    pub fn failing_messages(&self) -> Vec<String> {
        self.failing().map(|o| o.message.clone()).collect()
    }
}
