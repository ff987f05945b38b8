//! Vote tallies and voting status

use crate::context::Governance;
use crate::error::GovernanceResult;
use fidei_core::{ComplianceStatus, ExceptionVote, ResolutionDecision, VoteChoice};
use fidei_dispatch::TallySnapshot;
use fidei_store::{AssetRepo, MembershipRepo, TrustRepo, VoteRepo};
use serde::Serialize;

/// Votes needed to decide: half the committee rounded up, never zero
pub fn majority_of(members: usize) -> usize {
    members.div_ceil(2).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GovernanceMode {
    /// One committee member decides
    Individual,
    /// Committee majority decides
    Consensus,
}

/// Live count of votes on one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub total_members: usize,
    pub majority: usize,
    pub approve: usize,
    pub reject: usize,
}

impl Tally {
    pub fn count(votes: &[ExceptionVote], total_members: usize) -> Self {
        let approve = votes.iter().filter(|v| v.choice == VoteChoice::Approve).count();
        Self {
            total_members,
            majority: majority_of(total_members),
            approve,
            reject: votes.len() - approve,
        }
    }

    /// Approval wins ties when both reach the majority
    pub fn decision(&self) -> Option<ResolutionDecision> {
        if self.approve >= self.majority {
            Some(ResolutionDecision::Approved)
        } else if self.reject >= self.majority {
            Some(ResolutionDecision::Rejected)
        } else {
            None
        }
    }

    pub fn reason(&self, decision: ResolutionDecision) -> String {
        match decision {
            ResolutionDecision::Approved => format!(
                "Approved by committee majority ({}/{} votes in favour)",
                self.approve, self.total_members
            ),
            ResolutionDecision::Rejected => format!(
                "Rejected by committee majority ({}/{} votes against)",
                self.reject, self.total_members
            ),
        }
    }

    pub fn snapshot(&self) -> TallySnapshot {
        TallySnapshot {
            total_members: self.total_members,
            majority: self.majority,
            approve: self.approve,
            reject: self.reject,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VotingStatus {
    pub asset_id: String,
    pub trust_id: String,
    pub mode: GovernanceMode,
    pub status: ComplianceStatus,
    pub total_members: usize,
    pub majority: usize,
    pub votes_cast: usize,
    pub approve_votes: usize,
    pub reject_votes: usize,
    /// Active committee members who have not voted
    pub pending_votes: usize,
    pub votes: Vec<ExceptionVote>,
}

impl Governance {
    /// Current tally for an asset; reads live state on every call
    pub async fn get_voting_status(&self, asset_id: &str) -> GovernanceResult<VotingStatus> {
        let pool = self.db.pool();
        let asset = AssetRepo::get_by_id(pool, asset_id).await?;
        let trust = TrustRepo::get_by_id(pool, &asset.trust_id).await?;
        let committee: Vec<String> = MembershipRepo::list_active(pool, &trust.id)
            .await?
            .into_iter()
            .filter(|m| m.role_in_trust.is_committee())
            .map(|m| m.actor_id)
            .collect();
        let votes = VoteRepo::list_for_asset(pool, asset_id).await?;

        let tally = Tally::count(&votes, committee.len());
        let pending_votes = committee
            .iter()
            .filter(|id| !votes.iter().any(|v| &v.voter_id == *id))
            .count();
        let (mode, majority) = if trust.requires_consensus {
            (GovernanceMode::Consensus, tally.majority)
        } else {
            (GovernanceMode::Individual, 1)
        };

        Ok(VotingStatus {
            asset_id: asset.id,
            trust_id: trust.id,
            mode,
            status: asset.compliance_status,
            total_members: tally.total_members,
            majority,
            votes_cast: votes.len(),
            approve_votes: tally.approve,
            reject_votes: tally.reject,
            pending_votes,
            votes,
        })
    }
}
