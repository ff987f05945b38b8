//! Exception governance: single-approver decisions and committee votes

use crate::access::{authorize_committee, split_roles};
use crate::context::Governance;
use crate::error::{GovernanceError, GovernanceResult};
use crate::voting::Tally;
use fidei_core::{
    ActorRef, Asset, ExceptionResolution, ExceptionVote, ResolutionDecision, Trust, VoteChoice,
    VoteRosterEntry,
};
use fidei_dispatch::{Audience, DomainEvent, TallySnapshot};
use fidei_store::{AssetRepo, MembershipRepo, StoreError, TrustRepo, VoteRepo};
use serde::Serialize;
use sqlx::SqliteConnection;
use tokio::sync::OwnedMutexGuard;
use tracing::info;

/// Result of an approve, reject or vote call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionOutcome {
    pub asset: Asset,
    /// Vote recorded by this call, if any
    pub vote: Option<ExceptionVote>,
    /// The asset left PENDING_REVIEW in this call
    pub finalized: bool,
    pub tally: Option<TallySnapshot>,
}

fn decision_for(choice: VoteChoice) -> ResolutionDecision {
    match choice {
        VoteChoice::Approve => ResolutionDecision::Approved,
        VoteChoice::Reject => ResolutionDecision::Rejected,
    }
}

fn asset_key(asset_id: &str) -> String {
    format!("asset:{}", asset_id)
}

async fn insert_vote(conn: &mut SqliteConnection, vote: &ExceptionVote) -> GovernanceResult<()> {
    match VoteRepo::insert(&mut *conn, vote).await {
        Err(StoreError::UniqueViolation(_)) => Err(GovernanceError::DuplicateVote {
            asset_id: vote.asset_id.clone(),
            voter_id: vote.voter_id.clone(),
        }),
        other => Ok(other?),
    }
}

fn roster(votes: &[ExceptionVote]) -> Vec<VoteRosterEntry> {
    votes
        .iter()
        .map(|v| VoteRosterEntry {
            voter_id: v.voter_id.clone(),
            choice: v.choice,
            reason: v.reason.clone(),
            voted_at: v.voted_at,
        })
        .collect()
}

impl Governance {
    pub async fn approve_exception(
        &self,
        asset_id: &str,
        actor_id: &str,
        reason: Option<String>,
    ) -> GovernanceResult<ExceptionOutcome> {
        self.decide_exception(asset_id, actor_id, VoteChoice::Approve, reason).await
    }

    pub async fn reject_exception(
        &self,
        asset_id: &str,
        actor_id: &str,
        reason: Option<String>,
    ) -> GovernanceResult<ExceptionOutcome> {
        self.decide_exception(asset_id, actor_id, VoteChoice::Reject, reason).await
    }

    /// Record a committee vote.
    ///
    /// On a consensus trust the vote is tallied and may finalize the
    /// exception. On a single-approver trust the vote decides immediately.
    pub async fn vote_exception(
        &self,
        asset_id: &str,
        voter_id: &str,
        choice: VoteChoice,
        reason: Option<String>,
    ) -> GovernanceResult<ExceptionOutcome> {
        let guard = self.locks.lock(&asset_key(asset_id)).await;
        let (asset, trust) = self.load_pending(asset_id).await?;
        authorize_committee(self.db.pool(), voter_id, &trust.id).await?;

        let vote = ExceptionVote::new(&asset.id, &trust.id, voter_id, choice, reason);
        if trust.requires_consensus {
            self.tally_vote(guard, asset, trust, vote).await
        } else {
            let reason = vote.reason.clone();
            self.resolve_single(guard, asset, voter_id, choice, reason, Some(vote)).await
        }
    }

    /// Approve/reject entry point. On a consensus trust this is the
    /// caller's vote.
    async fn decide_exception(
        &self,
        asset_id: &str,
        actor_id: &str,
        choice: VoteChoice,
        reason: Option<String>,
    ) -> GovernanceResult<ExceptionOutcome> {
        let guard = self.locks.lock(&asset_key(asset_id)).await;
        let (asset, trust) = self.load_pending(asset_id).await?;
        authorize_committee(self.db.pool(), actor_id, &trust.id).await?;

        if trust.requires_consensus {
            let vote = ExceptionVote::new(&asset.id, &trust.id, actor_id, choice, reason);
            return self.tally_vote(guard, asset, trust, vote).await;
        }

        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| choice.default_reason().to_string());
        self.resolve_single(guard, asset, actor_id, choice, reason, None).await
    }

    async fn load_pending(&self, asset_id: &str) -> GovernanceResult<(Asset, Trust)> {
        let pool = self.db.pool();
        let asset = AssetRepo::get_by_id(pool, asset_id).await?;
        if !asset.compliance_status.is_pending() {
            return Err(GovernanceError::InvalidState(format!(
                "asset {} is {}, not PENDING_REVIEW",
                asset_id, asset.compliance_status
            )));
        }
        let trust = TrustRepo::get_by_id(pool, &asset.trust_id).await?;
        Ok((asset, trust))
    }

    /// The asset lock is held until commit and released before publishing
    async fn resolve_single(
        &self,
        guard: OwnedMutexGuard<()>,
        mut asset: Asset,
        actor_id: &str,
        choice: VoteChoice,
        reason: String,
        vote: Option<ExceptionVote>,
    ) -> GovernanceResult<ExceptionOutcome> {
        let decision = decision_for(choice);
        let decided_by = ActorRef::human(actor_id);
        asset.resolve(ExceptionResolution::single(decision, decided_by.clone(), reason.clone()))?;

        let mut tx = self.db.begin().await?;
        if let Some(ref vote) = vote {
            insert_vote(&mut tx, vote).await?;
        }
        if !AssetRepo::resolve_pending(&mut *tx, &asset).await? {
            return Err(GovernanceError::InvalidState(format!(
                "asset {} was resolved concurrently",
                asset.id
            )));
        }
        let votes = VoteRepo::list_for_asset(&mut *tx, &asset.id).await?;
        let memberships = MembershipRepo::list_active(&mut *tx, &asset.trust_id).await?;
        tx.commit().await?;
        drop(guard);

        info!(asset_id = %asset.id, actor_id, decision = ?decision, "Exception resolved");

        let (trustees, committee) = split_roles(&memberships);
        let tally = Tally::count(&votes, committee.len()).snapshot();
        let mut events = Vec::new();
        if let Some(ref vote) = vote {
            events.push(DomainEvent::ExceptionVoteCast {
                asset_id: asset.id.clone(),
                trust_id: asset.trust_id.clone(),
                voter_id: vote.voter_id.clone(),
                choice,
                tally,
                finalized: true,
                awaiting: Vec::new(),
            });
        }
        events.push(DomainEvent::ExceptionResolved {
            asset: asset.clone(),
            decision,
            decided_by,
            reason,
            by_consensus: false,
            audience: Audience { trustees, committee },
        });
        self.publish(&events).await;

        Ok(ExceptionOutcome {
            asset,
            vote,
            finalized: true,
            tally: Some(tally),
        })
    }

    /// Insert the vote, recount, and finalize once a side reaches majority.
    /// The status update is conditional, so a racing finalization makes
    /// this call fail and its vote roll back.
    async fn tally_vote(
        &self,
        guard: OwnedMutexGuard<()>,
        mut asset: Asset,
        trust: Trust,
        vote: ExceptionVote,
    ) -> GovernanceResult<ExceptionOutcome> {
        let mut tx = self.db.begin().await?;
        insert_vote(&mut tx, &vote).await?;

        let memberships = MembershipRepo::list_active(&mut *tx, &trust.id).await?;
        let (trustees, committee) = split_roles(&memberships);
        let votes = VoteRepo::list_for_asset(&mut *tx, &asset.id).await?;
        let tally = Tally::count(&votes, committee.len());

        let decision = tally.decision();
        let mut resolved = None;
        if let Some(decision) = decision {
            let reason = tally.reason(decision);
            asset.resolve(ExceptionResolution::consensus(
                decision,
                ActorRef::human(&vote.voter_id),
                reason.clone(),
                roster(&votes),
            ))?;
            if !AssetRepo::resolve_pending(&mut *tx, &asset).await? {
                return Err(GovernanceError::InvalidState(format!(
                    "asset {} was resolved concurrently",
                    asset.id
                )));
            }
            resolved = Some((decision, reason));
        }
        tx.commit().await?;
        drop(guard);

        info!(
            asset_id = %asset.id,
            voter_id = %vote.voter_id,
            choice = %vote.choice,
            approve = tally.approve,
            reject = tally.reject,
            majority = tally.majority,
            "Exception vote recorded"
        );

        let awaiting: Vec<String> = committee
            .iter()
            .filter(|id| !votes.iter().any(|v| &v.voter_id == *id))
            .cloned()
            .collect();
        let snapshot = tally.snapshot();

        let mut events = vec![DomainEvent::ExceptionVoteCast {
            asset_id: asset.id.clone(),
            trust_id: trust.id.clone(),
            voter_id: vote.voter_id.clone(),
            choice: vote.choice,
            tally: snapshot,
            finalized: resolved.is_some(),
            awaiting,
        }];
        if let Some((decision, reason)) = resolved.clone() {
            info!(asset_id = %asset.id, decision = ?decision, "Exception finalized by majority");
            events.push(DomainEvent::ExceptionResolved {
                asset: asset.clone(),
                decision,
                decided_by: ActorRef::human(&vote.voter_id),
                reason,
                by_consensus: true,
                audience: Audience { trustees, committee },
            });
        }
        self.publish(&events).await;

        Ok(ExceptionOutcome {
            asset,
            vote: Some(vote),
            finalized: resolved.is_some(),
            tally: Some(snapshot),
        })
    }
}
