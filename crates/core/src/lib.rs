//! Fidei Core - domain types for trust asset compliance
//!
//! This crate contains the fundamental types shared by every other crate:
//! - `Trust`: an irrevocable trust with its investment limits
//! - `Asset` / `AssetType`: an investment registered against a trust
//! - `ComplianceStatus`: the status lattice and its one-way exit from review
//! - `Actor` / `Role` / `ActorRef`: who acts, and the role-equivalence table
//! - `FeeRecord`: fiduciary fee bookkeeping gating new registrations
//! - `ValidationRecord`: typed rule outcomes persisted with every asset
//!
//! ```text
//!                register
//!                   │
//!        ┌──────────┼──────────────┐
//!        ▼          ▼              ▼
//!   COMPLIANT  PENDING_REVIEW  NON_COMPLIANT
//!                   │
//!          ┌────────┴────────┐
//!          ▼                 ▼
//!   EXCEPTION_APPROVED  NON_COMPLIANT
//! ```

pub mod actor;
pub mod amount;
pub mod asset;
pub mod error;
pub mod fee;
pub mod status;
pub mod trust;
pub mod validation;
pub mod vote;

pub use actor::{Actor, ActorRef, Membership, Role, ROLE_EQUIVALENCE};
pub use amount::{Amount, AmountError};
pub use asset::{Asset, AssetClass, AssetType, CredentialAnchor, MortgageLoanData};
pub use error::{CoreError, CoreResult};
pub use fee::{FeeRecord, MonthlyPayment};
pub use status::ComplianceStatus;
pub use trust::{Trust, TrustLimits};
pub use validation::{
    ExceptionResolution, MissingPayment, ResolutionDecision, RuleDetails, RuleFamily, RuleId, RuleOutcome,
    ValidationRecord, VoteRosterEntry,
};
pub use vote::{ExceptionVote, VoteChoice};
