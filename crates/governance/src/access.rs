//! Role and membership checks

use crate::error::{GovernanceError, GovernanceResult};
use fidei_core::{Actor, Membership, Role};
use fidei_store::{ActorRepo, MembershipRepo};
use sqlx::SqlitePool;
use tracing::warn;

/// Roles allowed to register assets
pub const REGISTRAR_ROLES: &[Role] = &[Role::Fiduciary, Role::CommitteeMember];

/// Roles allowed to decide or vote on exceptions
pub const COMMITTEE_ROLES: &[Role] = &[Role::CommitteeMember];

/// Load `actor_id` and check it may act on `trust_id` in one of `allowed`.
///
/// Members need an active membership whose in-trust role qualifies. Super
/// admins skip the membership lookup but their own role must still qualify.
pub async fn authorize(
    pool: &SqlitePool,
    actor_id: &str,
    trust_id: &str,
    allowed: &[Role],
) -> GovernanceResult<Actor> {
    let actor = ActorRepo::get_by_id(pool, actor_id).await?;

    if actor.bypasses_membership() {
        if !actor.role.satisfies_any(allowed) {
            warn!(actor_id, role = %actor.role, "Super admin role not allowed");
            return Err(GovernanceError::Authorization(format!(
                "role {} may not perform this action",
                actor.role
            )));
        }
        return Ok(actor);
    }

    let membership = MembershipRepo::find(pool, actor_id, trust_id).await?;
    match membership {
        Some(m) if m.grants(allowed) => Ok(actor),
        _ => {
            warn!(actor_id, trust_id, "Membership check failed");
            Err(GovernanceError::Authorization(format!(
                "actor {} has no qualifying membership in trust {}",
                actor_id, trust_id
            )))
        }
    }
}

/// Committee actions: any super admin, otherwise an active committee membership
pub async fn authorize_committee(pool: &SqlitePool, actor_id: &str, trust_id: &str) -> GovernanceResult<Actor> {
    let actor = ActorRepo::get_by_id(pool, actor_id).await?;
    if actor.bypasses_membership() {
        return Ok(actor);
    }
    if !actor.role.satisfies_any(COMMITTEE_ROLES) {
        warn!(actor_id, role = %actor.role, "Only committee members decide exceptions");
        return Err(GovernanceError::Authorization(format!(
            "role {} may not decide exceptions",
            actor.role
        )));
    }
    authorize(pool, actor_id, trust_id, COMMITTEE_ROLES).await
}

/// The linked beneficiary must be a beneficiary actor and member of the trust
pub async fn check_beneficiary(pool: &SqlitePool, beneficiary_id: &str, trust_id: &str) -> GovernanceResult<()> {
    let actor = match ActorRepo::get_by_id(pool, beneficiary_id).await {
        Ok(actor) => actor,
        Err(e) if e.is_not_found() => {
            return Err(GovernanceError::Validation(format!(
                "beneficiary {} does not exist",
                beneficiary_id
            )))
        }
        Err(e) => return Err(e.into()),
    };
    if !actor.role.satisfies(Role::Beneficiary) {
        return Err(GovernanceError::Validation(format!(
            "actor {} is not a beneficiary",
            beneficiary_id
        )));
    }

    let membership = MembershipRepo::find(pool, beneficiary_id, trust_id).await?;
    if !membership.is_some_and(|m| m.grants(&[Role::Beneficiary])) {
        return Err(GovernanceError::Validation(format!(
            "beneficiary {} does not belong to trust {}",
            beneficiary_id, trust_id
        )));
    }
    Ok(())
}

/// Active trustees and committee members, split by role
pub fn split_roles(memberships: &[Membership]) -> (Vec<String>, Vec<String>) {
    let mut trustees = Vec::new();
    let mut committee = Vec::new();
    for m in memberships.iter().filter(|m| m.active) {
        if m.role_in_trust.is_trustee() {
            trustees.push(m.actor_id.clone());
        } else if m.role_in_trust.is_committee() {
            committee.push(m.actor_id.clone());
        }
    }
    (trustees, committee)
}
