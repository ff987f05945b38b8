//! Domain events published after a transaction commits

use fidei_core::{ActorRef, Asset, ResolutionDecision, Trust, VoteChoice};
use serde::{Deserialize, Serialize};

/// People to notify about a trust, resolved before commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audience {
    pub trustees: Vec<String>,
    pub committee: Vec<String>,
}

/// Vote counts at the time of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallySnapshot {
    pub total_members: usize,
    pub majority: usize,
    pub approve: usize,
    pub reject: usize,
}

/// Committed state changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    AssetRegistered {
        trust: Trust,
        asset: Asset,
        audience: Audience,
    },
    ExceptionResolved {
        asset: Asset,
        decision: ResolutionDecision,
        decided_by: ActorRef,
        reason: String,
        by_consensus: bool,
        audience: Audience,
    },
    ExceptionVoteCast {
        asset_id: String,
        trust_id: String,
        voter_id: String,
        choice: VoteChoice,
        tally: TallySnapshot,
        finalized: bool,
        /// Active members who have not voted yet
        awaiting: Vec<String>,
    },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::AssetRegistered { .. } => "asset_registered",
            DomainEvent::ExceptionResolved { .. } => "exception_resolved",
            DomainEvent::ExceptionVoteCast { .. } => "exception_vote_cast",
        }
    }

    pub fn asset_id(&self) -> &str {
        match self {
            DomainEvent::AssetRegistered { asset, .. }
            | DomainEvent::ExceptionResolved { asset, .. } => &asset.id,
            DomainEvent::ExceptionVoteCast { asset_id, .. } => asset_id,
        }
    }
}
