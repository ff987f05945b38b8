//! Fidei Rules - pure compliance evaluators
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        RuleEngine                          │
//! │                                                            │
//! │  FeeRecord ──► fees::check_fiduciary_fees ──► gate         │
//! │                                                            │
//! │  holdings + candidate                                      │
//! │      ├──► investment::evaluate_investment ──┐              │
//! │      └──► loan::evaluate_loan ──────────────┤              │
//! │                                             ▼              │
//! │                               classifier::classify         │
//! │                                             │              │
//! │                                             ▼              │
//! │                                   ComplianceStatus         │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every evaluator is a pure function: no I/O, no clock reads, no errors.
//! Failures are reported as non-compliant [`RuleOutcome`](fidei_core::RuleOutcome)s.

pub mod classifier;
pub mod config;
pub mod engine;
pub mod fees;
pub mod investment;
pub mod loan;

pub use classifier::{classify, Severity};
pub use config::RulesConfig;
pub use engine::{AssetCandidate, Evaluation, RuleEngine};
pub use investment::{Holding, InvestmentContext};
