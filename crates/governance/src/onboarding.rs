//! Trust onboarding: trusts, actors, memberships and fee bookkeeping

use crate::context::Governance;
use crate::error::{GovernanceError, GovernanceResult};
use chrono::Utc;
use fidei_core::{Actor, FeeRecord, Membership, MonthlyPayment, Role, Trust, TrustLimits};
use fidei_store::{ActorRepo, FeeRepo, MembershipRepo, TrustRepo};
use rust_decimal::Decimal;
use tracing::info;

impl Governance {
    /// Create a trust with a validated capital and limit set
    pub async fn create_trust(
        &self,
        id: &str,
        name: &str,
        initial_capital: Decimal,
        limits: TrustLimits,
        requires_consensus: bool,
    ) -> GovernanceResult<Trust> {
        let trust = Trust::new(id, name, initial_capital, limits, requires_consensus)?;
        TrustRepo::insert(self.db.pool(), &trust).await.map_err(|e| {
            if e.is_unique_violation() {
                GovernanceError::Validation(format!("trust {} already exists", id))
            } else {
                e.into()
            }
        })?;
        info!(trust_id = %trust.id, consensus = requires_consensus, "Trust created");
        Ok(trust)
    }

    pub async fn add_actor(&self, actor: Actor) -> GovernanceResult<Actor> {
        ActorRepo::insert(self.db.pool(), &actor).await.map_err(|e| {
            if e.is_unique_violation() {
                GovernanceError::Validation(format!("actor {} already exists", actor.id))
            } else {
                e.into()
            }
        })?;
        info!(actor_id = %actor.id, role = %actor.role, "Actor added");
        Ok(actor)
    }

    /// Assign (or re-activate) an actor on a trust
    pub async fn assign_member(&self, actor_id: &str, trust_id: &str, role: Role) -> GovernanceResult<Membership> {
        let pool = self.db.pool();
        TrustRepo::get_by_id(pool, trust_id).await?;
        ActorRepo::get_by_id(pool, actor_id).await?;

        let membership = Membership {
            actor_id: actor_id.to_string(),
            trust_id: trust_id.to_string(),
            role_in_trust: role,
            active: true,
            assigned_at: Utc::now(),
        };
        MembershipRepo::assign(pool, &membership).await?;
        info!(actor_id, trust_id, role = %role, "Member assigned");
        Ok(membership)
    }

    pub async fn remove_member(&self, actor_id: &str, trust_id: &str) -> GovernanceResult<()> {
        MembershipRepo::deactivate(self.db.pool(), actor_id, trust_id).await?;
        info!(actor_id, trust_id, "Member deactivated");
        Ok(())
    }

    /// Set the fee schedule, optionally marking the study fee paid
    pub async fn set_fees(
        &self,
        trust_id: &str,
        study_fee_amount: Decimal,
        annual_fee: Decimal,
        study_fee_paid: bool,
    ) -> GovernanceResult<FeeRecord> {
        let pool = self.db.pool();
        TrustRepo::get_by_id(pool, trust_id).await?;

        let mut record = FeeRepo::get(pool, trust_id)
            .await?
            .unwrap_or_else(|| FeeRecord::new(trust_id, study_fee_amount, annual_fee));
        record.study_fee_amount = study_fee_amount;
        record.annual_fee = annual_fee;
        record.study_fee_paid = record.study_fee_paid || study_fee_paid;

        FeeRepo::upsert_record(pool, &record).await?;
        if record.study_fee_paid {
            FeeRepo::mark_study_fee_paid(pool, trust_id).await?;
        }
        Ok(record)
    }

    /// Record a monthly installment as paid; defaults to annual fee / 12
    pub async fn record_monthly_payment(
        &self,
        trust_id: &str,
        year: i32,
        month: u32,
        amount: Option<Decimal>,
    ) -> GovernanceResult<FeeRecord> {
        let pool = self.db.pool();
        let record = FeeRepo::get(pool, trust_id).await?.ok_or_else(|| {
            GovernanceError::Precondition(format!("no fee record for trust {}", trust_id))
        })?;

        let amount = amount.unwrap_or_else(|| record.monthly_installment());
        let payment = MonthlyPayment::paid(year, month, amount)?;
        FeeRepo::record_payment(pool, trust_id, &payment).await?;
        info!(trust_id, year, month, "Monthly fee recorded");

        FeeRepo::get(pool, trust_id)
            .await?
            .ok_or_else(|| GovernanceError::not_found("FeeRecord", trust_id))
    }
}
