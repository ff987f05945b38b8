//! Compliance status of a registered asset

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Compliance status of an asset.
///
/// `PendingReview` is the only non-terminal status. It is left exactly once,
/// either to `ExceptionApproved` or to `NonCompliant`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    PendingReview,
    ExceptionApproved,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "COMPLIANT",
            ComplianceStatus::NonCompliant => "NON_COMPLIANT",
            ComplianceStatus::PendingReview => "PENDING_REVIEW",
            ComplianceStatus::ExceptionApproved => "EXCEPTION_APPROVED",
        }
    }

    /// Value of the `compliant` flag stored next to this status
    pub fn is_compliant(&self) -> bool {
        matches!(
            self,
            ComplianceStatus::Compliant | ComplianceStatus::ExceptionApproved
        )
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ComplianceStatus::PendingReview)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// Check the exit transition out of review
    pub fn transition_to(self, next: ComplianceStatus) -> CoreResult<ComplianceStatus> {
        match (self, next) {
            (ComplianceStatus::PendingReview, ComplianceStatus::ExceptionApproved)
            | (ComplianceStatus::PendingReview, ComplianceStatus::NonCompliant) => Ok(next),
            (from, to) => Err(CoreError::InvalidTransition { from, to }),
        }
    }
}
