//! Repository implementations for SQLite
//!
//! Every function takes any SQLite executor, so the same call works on the
//! pool or inside a transaction (`&mut *tx`).

use crate::error::{StoreError, StoreResult};
use crate::schema::*;
use fidei_core::{
    Actor, Asset, AssetType, ComplianceStatus, CredentialAnchor, ExceptionVote, FeeRecord,
    Membership, MonthlyPayment, Trust,
};
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

// ============================================================================
// Trust Repository
// ============================================================================

pub struct TrustRepo;

impl TrustRepo {
    pub async fn insert<'e, E: SqliteExecutor<'e>>(exec: E, trust: &Trust) -> StoreResult<()> {
        let row = TrustRow::from(trust);
        sqlx::query(
            "INSERT INTO trusts (id, name, initial_capital, bond_limit_percent, other_limit_percent, requires_consensus, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.initial_capital)
        .bind(&row.bond_limit_percent)
        .bind(&row.other_limit_percent)
        .bind(row.requires_consensus)
        .bind(row.created_at)
        .execute(exec)
        .await
        .map_err(|e| StoreError::from_insert(e, &format!("trust {}", trust.id)))?;
        Ok(())
    }

    pub async fn get_by_id<'e, E: SqliteExecutor<'e>>(exec: E, id: &str) -> StoreResult<Trust> {
        sqlx::query_as::<_, TrustRow>("SELECT * FROM trusts WHERE id = ?")
            .bind(id)
            .fetch_optional(exec)
            .await?
            .ok_or_else(|| StoreError::not_found("Trust", id))?
            .try_into()
    }

    pub async fn list<'e, E: SqliteExecutor<'e>>(exec: E) -> StoreResult<Vec<Trust>> {
        sqlx::query_as::<_, TrustRow>("SELECT * FROM trusts ORDER BY created_at")
            .fetch_all(exec)
            .await?
            .into_iter()
            .map(Trust::try_from)
            .collect()
    }
}

// ============================================================================
// Actor Repository
// ============================================================================

pub struct ActorRepo;

impl ActorRepo {
    pub async fn insert<'e, E: SqliteExecutor<'e>>(exec: E, actor: &Actor) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO actors (id, name, email, role, is_super_admin, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&actor.id)
        .bind(&actor.name)
        .bind(&actor.email)
        .bind(actor.role.to_string())
        .bind(actor.is_super_admin)
        .bind(actor.created_at)
        .execute(exec)
        .await
        .map_err(|e| StoreError::from_insert(e, &format!("actor {}", actor.id)))?;
        Ok(())
    }

    pub async fn get_by_id<'e, E: SqliteExecutor<'e>>(exec: E, id: &str) -> StoreResult<Actor> {
        sqlx::query_as::<_, ActorRow>("SELECT * FROM actors WHERE id = ?")
            .bind(id)
            .fetch_optional(exec)
            .await?
            .ok_or_else(|| StoreError::not_found("Actor", id))?
            .try_into()
    }
}

// ============================================================================
// Membership Repository
// ============================================================================

pub struct MembershipRepo;

impl MembershipRepo {
    /// Assign (or re-activate) an actor on a trust
    pub async fn assign<'e, E: SqliteExecutor<'e>>(exec: E, membership: &Membership) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO memberships (actor_id, trust_id, role_in_trust, active, assigned_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(actor_id, trust_id) DO UPDATE SET
                role_in_trust = excluded.role_in_trust,
                active = excluded.active,
                assigned_at = excluded.assigned_at",
        )
        .bind(&membership.actor_id)
        .bind(&membership.trust_id)
        .bind(membership.role_in_trust.to_string())
        .bind(membership.active)
        .bind(membership.assigned_at)
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn deactivate<'e, E: SqliteExecutor<'e>>(
        exec: E,
        actor_id: &str,
        trust_id: &str,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE memberships SET active = 0 WHERE actor_id = ? AND trust_id = ?",
        )
        .bind(actor_id)
        .bind(trust_id)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(
                "Membership",
                &format!("{}@{}", actor_id, trust_id),
            ));
        }
        Ok(())
    }

    pub async fn find<'e, E: SqliteExecutor<'e>>(
        exec: E,
        actor_id: &str,
        trust_id: &str,
    ) -> StoreResult<Option<Membership>> {
        sqlx::query_as::<_, MembershipRow>(
            "SELECT * FROM memberships WHERE actor_id = ? AND trust_id = ?",
        )
        .bind(actor_id)
        .bind(trust_id)
        .fetch_optional(exec)
        .await?
        .map(Membership::try_from)
        .transpose()
    }

    /// Active memberships of a trust, oldest assignment first
    pub async fn list_active<'e, E: SqliteExecutor<'e>>(
        exec: E,
        trust_id: &str,
    ) -> StoreResult<Vec<Membership>> {
        sqlx::query_as::<_, MembershipRow>(
            "SELECT * FROM memberships WHERE trust_id = ? AND active = 1 ORDER BY assigned_at, actor_id",
        )
        .bind(trust_id)
        .fetch_all(exec)
        .await?
        .into_iter()
        .map(Membership::try_from)
        .collect()
    }
}

// ============================================================================
// Fee Repository
// ============================================================================

pub struct FeeRepo;

impl FeeRepo {
    /// Create or update the fee record header (payments are kept)
    pub async fn upsert_record<'e, E: SqliteExecutor<'e>>(exec: E, record: &FeeRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO fee_records (trust_id, study_fee_amount, study_fee_paid, annual_fee)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(trust_id) DO UPDATE SET
                study_fee_amount = excluded.study_fee_amount,
                study_fee_paid = excluded.study_fee_paid,
                annual_fee = excluded.annual_fee",
        )
        .bind(&record.trust_id)
        .bind(record.study_fee_amount.to_string())
        .bind(record.study_fee_paid)
        .bind(record.annual_fee.to_string())
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn mark_study_fee_paid<'e, E: SqliteExecutor<'e>>(exec: E, trust_id: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE fee_records SET study_fee_paid = 1 WHERE trust_id = ?")
            .bind(trust_id)
            .execute(exec)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("FeeRecord", trust_id));
        }
        Ok(())
    }

    pub async fn record_payment<'e, E: SqliteExecutor<'e>>(
        exec: E,
        trust_id: &str,
        payment: &MonthlyPayment,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO monthly_payments (trust_id, year, month, amount, paid, paid_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(trust_id, year, month) DO UPDATE SET
                amount = excluded.amount,
                paid = excluded.paid,
                paid_at = excluded.paid_at",
        )
        .bind(trust_id)
        .bind(payment.year as i64)
        .bind(payment.month as i64)
        .bind(payment.amount.to_string())
        .bind(payment.paid)
        .bind(payment.paid_at)
        .execute(exec)
        .await?;
        Ok(())
    }

    /// Fee record with its monthly payments, `None` if the trust has none
    pub async fn get(pool: &SqlitePool, trust_id: &str) -> StoreResult<Option<FeeRecord>> {
        let Some(row) = sqlx::query_as::<_, FeeRecordRow>(
            "SELECT * FROM fee_records WHERE trust_id = ?",
        )
        .bind(trust_id)
        .fetch_optional(pool)
        .await?
        else {
            return Ok(None);
        };

        let monthly_payments = sqlx::query_as::<_, MonthlyPaymentRow>(
            "SELECT * FROM monthly_payments WHERE trust_id = ? ORDER BY year, month",
        )
        .bind(trust_id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(MonthlyPayment::try_from)
        .collect::<StoreResult<Vec<_>>>()?;

        Ok(Some(FeeRecord {
            trust_id: row.trust_id,
            study_fee_amount: parse_decimal(&row.study_fee_amount)?,
            study_fee_paid: row.study_fee_paid,
            annual_fee: parse_decimal(&row.annual_fee)?,
            monthly_payments,
        }))
    }
}

// ============================================================================
// Asset Repository
// ============================================================================

/// Filters for listing a trust's assets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetQuery {
    pub trust_id: String,
    pub asset_type: Option<AssetType>,
    pub status: Option<ComplianceStatus>,
    pub beneficiary_id: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl AssetQuery {
    pub const DEFAULT_LIMIT: i64 = 100;

    pub fn for_trust(trust_id: impl Into<String>) -> Self {
        Self {
            trust_id: trust_id.into(),
            asset_type: None,
            status: None,
            beneficiary_id: None,
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }

    fn push_filters(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE trust_id = ").push_bind(self.trust_id.clone());
        if let Some(asset_type) = self.asset_type {
            qb.push(" AND asset_type = ").push_bind(asset_type.to_string());
        }
        if let Some(status) = self.status {
            qb.push(" AND compliance_status = ").push_bind(status.as_str());
        }
        if let Some(ref beneficiary_id) = self.beneficiary_id {
            qb.push(" AND beneficiary_id = ").push_bind(beneficiary_id.clone());
        }
    }
}

pub struct AssetRepo;

impl AssetRepo {
    pub async fn insert<'e, E: SqliteExecutor<'e>>(exec: E, asset: &Asset) -> StoreResult<()> {
        let row = AssetRow::from_asset(asset)?;
        sqlx::query(
            "INSERT INTO assets (id, trust_id, asset_type, value_mxn, description, document_hash, beneficiary_id,
                                 compliance_status, compliant, validation, registered_by, registered_at,
                                 credential_id, credential_hash, anchor_reference, anchor_network, anchored_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.trust_id)
        .bind(&row.asset_type)
        .bind(&row.value_mxn)
        .bind(&row.description)
        .bind(&row.document_hash)
        .bind(&row.beneficiary_id)
        .bind(&row.compliance_status)
        .bind(row.compliant)
        .bind(&row.validation)
        .bind(&row.registered_by)
        .bind(row.registered_at)
        .bind(&row.credential_id)
        .bind(&row.credential_hash)
        .bind(&row.anchor_reference)
        .bind(&row.anchor_network)
        .bind(row.anchored_at)
        .execute(exec)
        .await
        .map_err(|e| StoreError::from_insert(e, &format!("asset {}", asset.id)))?;
        Ok(())
    }

    pub async fn get_by_id<'e, E: SqliteExecutor<'e>>(exec: E, id: &str) -> StoreResult<Asset> {
        sqlx::query_as::<_, AssetRow>("SELECT * FROM assets WHERE id = ?")
            .bind(id)
            .fetch_optional(exec)
            .await?
            .ok_or_else(|| StoreError::not_found("Asset", id))?
            .try_into()
    }

    /// Type and value of every asset of the trust not awaiting review
    pub async fn holdings_excluding_pending<'e, E: SqliteExecutor<'e>>(
        exec: E,
        trust_id: &str,
    ) -> StoreResult<Vec<(AssetType, Decimal)>> {
        sqlx::query_as::<_, HoldingRow>(
            "SELECT asset_type, value_mxn FROM assets WHERE trust_id = ? AND compliance_status != 'PENDING_REVIEW'",
        )
        .bind(trust_id)
        .fetch_all(exec)
        .await?
        .iter()
        .map(HoldingRow::parse)
        .collect()
    }

    /// Page of assets, newest first
    pub async fn list<'e, E: SqliteExecutor<'e>>(exec: E, query: &AssetQuery) -> StoreResult<Vec<Asset>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM assets");
        query.push_filters(&mut qb);
        qb.push(" ORDER BY registered_at DESC, rowid DESC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);

        qb.build_query_as::<AssetRow>()
            .fetch_all(exec)
            .await?
            .into_iter()
            .map(Asset::try_from)
            .collect()
    }

    /// Number of assets matching the filters, ignoring limit/offset
    pub async fn count<'e, E: SqliteExecutor<'e>>(exec: E, query: &AssetQuery) -> StoreResult<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM assets");
        query.push_filters(&mut qb);
        let count = qb.build_query_scalar::<i64>().fetch_one(exec).await?;
        Ok(count)
    }

    /// Write the resolved status only if the row is still PENDING_REVIEW.
    ///
    /// Returns `false` when another writer resolved it first.
    pub async fn resolve_pending<'e, E: SqliteExecutor<'e>>(exec: E, asset: &Asset) -> StoreResult<bool> {
        let validation = serde_json::to_string(&asset.validation)?;
        let result = sqlx::query(
            "UPDATE assets SET compliance_status = ?, compliant = ?, validation = ?
             WHERE id = ? AND compliance_status = 'PENDING_REVIEW'",
        )
        .bind(asset.compliance_status.as_str())
        .bind(asset.compliant)
        .bind(validation)
        .bind(&asset.id)
        .execute(exec)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn record_credential<'e, E: SqliteExecutor<'e>>(
        exec: E,
        asset_id: &str,
        anchor: &CredentialAnchor,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE assets SET credential_id = ?, credential_hash = ?, anchor_reference = ?, anchor_network = ?, anchored_at = ?
             WHERE id = ?",
        )
        .bind(&anchor.credential_id)
        .bind(&anchor.credential_hash)
        .bind(&anchor.anchor_reference)
        .bind(&anchor.network)
        .bind(anchor.anchored_at)
        .bind(asset_id)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Asset", asset_id));
        }
        Ok(())
    }
}

// ============================================================================
// Vote Repository
// ============================================================================

pub struct VoteRepo;

impl VoteRepo {
    /// Insert a vote; a second vote by the same voter is a `UniqueViolation`
    pub async fn insert<'e, E: SqliteExecutor<'e>>(exec: E, vote: &ExceptionVote) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO exception_votes (id, asset_id, trust_id, voter_id, choice, reason, voted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&vote.id)
        .bind(&vote.asset_id)
        .bind(&vote.trust_id)
        .bind(&vote.voter_id)
        .bind(vote.choice.as_str())
        .bind(&vote.reason)
        .bind(vote.voted_at)
        .execute(exec)
        .await
        .map_err(|e| {
            StoreError::from_insert(e, &format!("vote of {} on asset {}", vote.voter_id, vote.asset_id))
        })?;
        Ok(())
    }

    /// Votes on an asset, oldest first
    pub async fn list_for_asset<'e, E: SqliteExecutor<'e>>(
        exec: E,
        asset_id: &str,
    ) -> StoreResult<Vec<ExceptionVote>> {
        sqlx::query_as::<_, VoteRow>(
            "SELECT * FROM exception_votes WHERE asset_id = ? ORDER BY voted_at, rowid",
        )
        .bind(asset_id)
        .fetch_all(exec)
        .await?
        .into_iter()
        .map(ExceptionVote::try_from)
        .collect()
    }
}

// ============================================================================
// Alert Repository
// ============================================================================

pub struct AlertRepo;

impl AlertRepo {
    pub async fn insert<'e, E: SqliteExecutor<'e>>(exec: E, alert: &AlertRow) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO alerts (id, recipient_id, trust_id, asset_id, alert_type, subtype, severity, message, is_read, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&alert.id)
        .bind(&alert.recipient_id)
        .bind(&alert.trust_id)
        .bind(&alert.asset_id)
        .bind(&alert.alert_type)
        .bind(&alert.subtype)
        .bind(&alert.severity)
        .bind(&alert.message)
        .bind(alert.is_read)
        .bind(alert.created_at)
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn list_for_recipient<'e, E: SqliteExecutor<'e>>(
        exec: E,
        recipient_id: &str,
    ) -> StoreResult<Vec<AlertRow>> {
        let rows = sqlx::query_as::<_, AlertRow>(
            "SELECT * FROM alerts WHERE recipient_id = ? ORDER BY created_at, rowid",
        )
        .bind(recipient_id)
        .fetch_all(exec)
        .await?;
        Ok(rows)
    }

    pub async fn list_for_asset<'e, E: SqliteExecutor<'e>>(
        exec: E,
        asset_id: &str,
    ) -> StoreResult<Vec<AlertRow>> {
        let rows = sqlx::query_as::<_, AlertRow>(
            "SELECT * FROM alerts WHERE asset_id = ? ORDER BY created_at, rowid",
        )
        .bind(asset_id)
        .fetch_all(exec)
        .await?;
        Ok(rows)
    }
}

// ============================================================================
// Audit Repository
// ============================================================================

pub struct AuditRepo;

impl AuditRepo {
    pub async fn insert<'e, E: SqliteExecutor<'e>>(exec: E, entry: &AuditRow) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO audit_log (id, actor_id, action, entity_type, entity_id, trust_id, details, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.actor_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.trust_id)
        .bind(&entry.details)
        .bind(entry.created_at)
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn list_for_entity<'e, E: SqliteExecutor<'e>>(
        exec: E,
        entity_type: &str,
        entity_id: &str,
    ) -> StoreResult<Vec<AuditRow>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            "SELECT * FROM audit_log WHERE entity_type = ? AND entity_id = ? ORDER BY created_at, rowid",
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(exec)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use chrono::Utc;
    use fidei_core::{
        Amount, ComplianceStatus, ExceptionResolution, ResolutionDecision, Role, TrustLimits,
        ValidationRecord, VoteChoice,
    };
    use fidei_core::ActorRef;
    use rust_decimal_macros::dec;

    async fn seeded() -> Database {
        seed(Database::in_memory().await.unwrap()).await
    }

    async fn seed(db: Database) -> Database {
        let limits = TrustLimits::new(Some(dec!(30)), Some(dec!(70))).unwrap();
        let trust = Trust::new("trust-1", "Trust 10045", dec!(1000000), limits, true).unwrap();
        TrustRepo::insert(db.pool(), &trust).await.unwrap();
        for (id, role) in [
            ("fid-1", Role::Fiduciary),
            ("com-1", Role::CommitteeMember),
            ("com-2", Role::CommitteeMember),
        ] {
            ActorRepo::insert(db.pool(), &Actor::new(id, id, role)).await.unwrap();
        }
        db
    }

    fn asset(id: &str, asset_type: AssetType, value: Decimal, status: ComplianceStatus) -> Asset {
        Asset {
            id: id.into(),
            trust_id: "trust-1".into(),
            asset_type,
            value_mxn: Amount::new(value).unwrap(),
            description: Some("test".into()),
            document_hash: None,
            beneficiary_id: None,
            compliance_status: status,
            compliant: status.is_compliant(),
            validation: ValidationRecord::default(),
            registered_by: "fid-1".into(),
            registered_at: Utc::now(),
            credential: None,
        }
    }

    #[tokio::test]
    async fn test_trust_and_actor_lookup() {
        let db = seeded().await;
        let trust = TrustRepo::get_by_id(db.pool(), "trust-1").await.unwrap();
        assert_eq!(trust.initial_capital.value(), dec!(1000000));
        assert!(trust.requires_consensus);

        let actor = ActorRepo::get_by_id(db.pool(), "com-1").await.unwrap();
        assert_eq!(actor.role, Role::CommitteeMember);

        let missing = TrustRepo::get_by_id(db.pool(), "nope").await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_membership_assign_and_deactivate() {
        let db = seeded().await;
        let membership = Membership {
            actor_id: "com-1".into(),
            trust_id: "trust-1".into(),
            role_in_trust: Role::CommitteeMember,
            active: true,
            assigned_at: Utc::now(),
        };
        MembershipRepo::assign(db.pool(), &membership).await.unwrap();
        assert_eq!(MembershipRepo::list_active(db.pool(), "trust-1").await.unwrap().len(), 1);

        MembershipRepo::deactivate(db.pool(), "com-1", "trust-1").await.unwrap();
        assert!(MembershipRepo::list_active(db.pool(), "trust-1").await.unwrap().is_empty());
        let found = MembershipRepo::find(db.pool(), "com-1", "trust-1").await.unwrap().unwrap();
        assert!(!found.active);

        // re-assigning re-activates
        MembershipRepo::assign(db.pool(), &membership).await.unwrap();
        assert_eq!(MembershipRepo::list_active(db.pool(), "trust-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fee_record_with_payments() {
        let db = seeded().await;
        assert!(FeeRepo::get(db.pool(), "trust-1").await.unwrap().is_none());

        let record = FeeRecord::new("trust-1", dec!(5000), dec!(18000));
        FeeRepo::upsert_record(db.pool(), &record).await.unwrap();
        FeeRepo::mark_study_fee_paid(db.pool(), "trust-1").await.unwrap();
        let payment = MonthlyPayment::paid(2026, 2, dec!(1500)).unwrap();
        FeeRepo::record_payment(db.pool(), "trust-1", &payment).await.unwrap();
        FeeRepo::record_payment(db.pool(), "trust-1", &payment).await.unwrap();

        let loaded = FeeRepo::get(db.pool(), "trust-1").await.unwrap().unwrap();
        assert!(loaded.study_fee_paid);
        assert_eq!(loaded.monthly_payments.len(), 1);
        assert!(loaded.is_month_paid(2026, 2));
        assert_eq!(loaded.annual_fee, dec!(18000));
    }

    #[tokio::test]
    async fn test_holdings_skip_pending_review() {
        let db = seeded().await;
        let assets = [
            asset("a-1", AssetType::GovernmentBond, dec!(100000), ComplianceStatus::Compliant),
            asset("a-2", AssetType::GovernmentBond, dec!(50000), ComplianceStatus::PendingReview),
            asset("a-3", AssetType::MortgageLoan, dec!(70000), ComplianceStatus::NonCompliant),
        ];
        for a in &assets {
            AssetRepo::insert(db.pool(), a).await.unwrap();
        }

        let mut holdings = AssetRepo::holdings_excluding_pending(db.pool(), "trust-1")
            .await
            .unwrap();
        holdings.sort_by_key(|(_, v)| *v);
        assert_eq!(
            holdings,
            vec![
                (AssetType::MortgageLoan, dec!(70000)),
                (AssetType::GovernmentBond, dec!(100000)),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_filters_and_pagination() {
        let db = seeded().await;
        for i in 0..5 {
            let status = if i % 2 == 0 {
                ComplianceStatus::Compliant
            } else {
                ComplianceStatus::PendingReview
            };
            let a = asset(&format!("a-{}", i), AssetType::InsuranceReserve, dec!(1000), status);
            AssetRepo::insert(db.pool(), &a).await.unwrap();
        }

        let mut query = AssetQuery::for_trust("trust-1");
        assert_eq!(AssetRepo::count(db.pool(), &query).await.unwrap(), 5);

        query.status = Some(ComplianceStatus::PendingReview);
        assert_eq!(AssetRepo::count(db.pool(), &query).await.unwrap(), 2);

        let mut page = AssetQuery::for_trust("trust-1");
        page.limit = 2;
        page.offset = 0;
        let first = AssetRepo::list(db.pool(), &page).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, "a-4");

        page.offset = 4;
        let last = AssetRepo::list(db.pool(), &page).await.unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].id, "a-0");
    }

    #[tokio::test]
    async fn test_resolve_pending_is_conditional() {
        let db = seeded().await;
        let mut a = asset("a-1", AssetType::GovernmentBond, dec!(400000), ComplianceStatus::PendingReview);
        AssetRepo::insert(db.pool(), &a).await.unwrap();

        a.resolve(ExceptionResolution::single(
            ResolutionDecision::Approved,
            ActorRef::human("com-1"),
            "ok",
        ))
        .unwrap();
        assert!(AssetRepo::resolve_pending(db.pool(), &a).await.unwrap());
        // second writer loses
        assert!(!AssetRepo::resolve_pending(db.pool(), &a).await.unwrap());

        let stored = AssetRepo::get_by_id(db.pool(), "a-1").await.unwrap();
        assert_eq!(stored.compliance_status, ComplianceStatus::ExceptionApproved);
        assert!(stored.compliant);
        assert_eq!(stored.validation.resolution.unwrap().reason, "ok");
    }

    #[tokio::test]
    async fn test_duplicate_vote_is_unique_violation() {
        let db = seeded().await;
        let a = asset("a-1", AssetType::GovernmentBond, dec!(400000), ComplianceStatus::PendingReview);
        AssetRepo::insert(db.pool(), &a).await.unwrap();

        let vote = ExceptionVote::new("a-1", "trust-1", "com-1", VoteChoice::Approve, None);
        VoteRepo::insert(db.pool(), &vote).await.unwrap();

        let again = ExceptionVote::new("a-1", "trust-1", "com-1", VoteChoice::Reject, None);
        let err = VoteRepo::insert(db.pool(), &again).await.unwrap_err();
        assert!(err.is_unique_violation());

        let other = ExceptionVote::new("a-1", "trust-1", "com-2", VoteChoice::Reject, None);
        VoteRepo::insert(db.pool(), &other).await.unwrap();

        let votes = VoteRepo::list_for_asset(db.pool(), "a-1").await.unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].voter_id, "com-1");
        assert_eq!(votes[0].choice, VoteChoice::Approve);
    }

    #[tokio::test]
    async fn test_record_credential() {
        let db = seeded().await;
        let a = asset("a-1", AssetType::SocialHousing, dec!(1000), ComplianceStatus::Compliant);
        AssetRepo::insert(db.pool(), &a).await.unwrap();

        let anchor = CredentialAnchor {
            credential_id: "did:fidei:asset:a-1".into(),
            credential_hash: "abc".into(),
            anchor_reference: Some("ref".into()),
            network: Some("local-journal".into()),
            anchored_at: Some(Utc::now()),
        };
        AssetRepo::record_credential(db.pool(), "a-1", &anchor).await.unwrap();

        let stored = AssetRepo::get_by_id(db.pool(), "a-1").await.unwrap();
        let credential = stored.credential.unwrap();
        assert_eq!(credential.credential_hash, "abc");
        assert_eq!(credential.network.as_deref(), Some("local-journal"));

        let err = AssetRepo::record_credential(db.pool(), "missing", &anchor).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_transaction_rollback_discards_asset() {
        let db = seeded().await;
        let a = asset("a-1", AssetType::SocialHousing, dec!(1000), ComplianceStatus::Compliant);

        let mut tx = db.begin().await.unwrap();
        AssetRepo::insert(&mut *tx, &a).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(AssetRepo::get_by_id(db.pool(), "a-1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fidei.db");
        {
            let db = seed(Database::open(&path).await.unwrap()).await;
            let a = asset("a-1", AssetType::GovernmentBond, dec!(1000), ComplianceStatus::Compliant);
            AssetRepo::insert(db.pool(), &a).await.unwrap();
            db.pool().close().await;
        }

        let db = Database::open(&path).await.unwrap();
        let stored = AssetRepo::get_by_id(db.pool(), "a-1").await.unwrap();
        assert_eq!(stored.value_mxn.value(), dec!(1000));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_read_then_write_transactions_wait_for_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let db = seed(Database::open(dir.path().join("fidei.db")).await.unwrap()).await;

        let handles: Vec<_> = (0..12)
            .map(|i| {
                let db = db.clone();
                tokio::spawn(async move {
                    let mut tx = db.begin().await?;
                    AssetRepo::holdings_excluding_pending(&mut *tx, "trust-1").await?;
                    let a = asset(&format!("a-{}", i), AssetType::GovernmentBond, dec!(1), ComplianceStatus::Compliant);
                    AssetRepo::insert(&mut *tx, &a).await?;
                    tx.commit().await?;
                    Ok::<_, StoreError>(())
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let holdings = AssetRepo::holdings_excluding_pending(db.pool(), "trust-1").await.unwrap();
        assert_eq!(holdings.len(), 12);
    }
}
