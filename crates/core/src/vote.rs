//! Committee votes on pending exceptions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteChoice {
    Approve,
    Reject,
}

impl VoteChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteChoice::Approve => "APPROVE",
            VoteChoice::Reject => "REJECT",
        }
    }

    /// Reason recorded when the voter leaves it blank
    pub fn default_reason(&self) -> &'static str {
        match self {
            VoteChoice::Approve => "Approved by technical committee member",
            VoteChoice::Reject => "Rejected by technical committee member",
        }
    }
}

/// A single vote. At most one exists per (asset, voter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionVote {
    pub id: String,
    pub asset_id: String,
    pub trust_id: String,
    pub voter_id: String,
    pub choice: VoteChoice,
    pub reason: String,
    pub voted_at: DateTime<Utc>,
}

impl ExceptionVote {
    pub fn new(
        asset_id: impl Into<String>,
        trust_id: impl Into<String>,
        voter_id: impl Into<String>,
        choice: VoteChoice,
        reason: Option<String>,
    ) -> Self {
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| choice.default_reason().to_string());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            asset_id: asset_id.into(),
            trust_id: trust_id.into(),
            voter_id: voter_id.into(),
            choice,
            reason,
            voted_at: Utc::now(),
        }
    }
}
