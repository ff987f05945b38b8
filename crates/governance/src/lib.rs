//! Fidei Governance - request-scoped compliance workflows
//!
//! [`Governance`] exposes the operations callers use:
//!
//! - `register_asset`, `get_asset_by_id`, `list_assets`
//! - `approve_exception`, `reject_exception`, `vote_exception`
//! - `get_voting_status`
//! - onboarding helpers for trusts, actors, memberships and fees
//!
//! Each call commits its state change in one SQLite transaction and then
//! publishes domain events; alerts, audit and credential anchoring run after
//! the commit and cannot undo it.

pub mod access;
pub mod adapters;
pub mod clock;
pub mod context;
pub mod error;
pub mod exception;
pub mod locks;
pub mod onboarding;
pub mod registration;
pub mod voting;

pub use clock::{Clock, FixedClock, SystemClock};
pub use context::Governance;
pub use error::{ErrorKind, GovernanceError, GovernanceResult};
pub use exception::ExceptionOutcome;
pub use locks::KeyedLocks;
pub use registration::{AssetFilter, AssetPage, RegisterAsset, Registration};
pub use voting::{majority_of, GovernanceMode, Tally, VotingStatus};
