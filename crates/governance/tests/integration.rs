//! End-to-end governance scenarios against in-memory and file databases

use chrono::NaiveDate;
use fidei_core::{
    Actor, AssetType, ComplianceStatus, MortgageLoanData, ResolutionDecision, Role, RuleId,
    TrustLimits, VoteChoice,
};
use fidei_dispatch::memory::{MemoryAudit, MemoryNotifications, MemoryRecorder, StubAnchor};
use fidei_dispatch::{
    AlertFanout, AlertSeverity, AlertSubtype, AuditAction, AuditTrail, CredentialAnchoring,
    Dispatcher, Ed25519Issuer, JournalAnchor,
};
use fidei_governance::adapters::SqliteCredentialRecorder;
use fidei_governance::{
    AssetFilter, ErrorKind, FixedClock, Governance, GovernanceError, GovernanceMode, RegisterAsset,
};
use fidei_rules::RuleEngine;
use fidei_store::Database;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

struct Harness {
    gov: Arc<Governance>,
    notifications: Arc<MemoryNotifications>,
    audit: Arc<MemoryAudit>,
    _anchor_dir: TempDir,
}

const TRUST: &str = "trust-1";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
}

async fn harness(requires_consensus: bool) -> Harness {
    let anchor_dir = tempfile::tempdir().unwrap();
    let db = Database::in_memory().await.unwrap();
    build(db, anchor_dir, requires_consensus).await
}

/// Same setup on a database file with a real connection pool
async fn file_harness(requires_consensus: bool) -> Harness {
    let anchor_dir = tempfile::tempdir().unwrap();
    let db = Database::open(anchor_dir.path().join("fidei.db")).await.unwrap();
    build(db, anchor_dir, requires_consensus).await
}

async fn build(db: Database, anchor_dir: TempDir, requires_consensus: bool) -> Harness {
    let notifications = Arc::new(MemoryNotifications::new());
    let audit = Arc::new(MemoryAudit::new());

    let dispatcher = Dispatcher::new(Duration::from_secs(2))
        .with_subscriber(Arc::new(AlertFanout::new(notifications.clone())))
        .with_subscriber(Arc::new(AuditTrail::new(audit.clone())))
        .with_subscriber(Arc::new(CredentialAnchoring::new(
            Arc::new(Ed25519Issuer::generate("did:fidei:issuer")),
            Arc::new(JournalAnchor::in_dir(anchor_dir.path()).unwrap()),
            Arc::new(SqliteCredentialRecorder::new(db.clone())),
            audit.clone(),
        )));

    let gov = Governance::new(db, RuleEngine::default(), dispatcher);
    let gov = seeded(gov, requires_consensus).await;

    Harness {
        gov,
        notifications,
        audit,
        _anchor_dir: anchor_dir,
    }
}

/// Actors plus trust-1 with members and fees paid through 2026-03
async fn seeded(gov: Governance, requires_consensus: bool) -> Arc<Governance> {
    let gov = gov.with_clock(Arc::new(FixedClock(today())));

    for (id, role) in [
        ("fid-1", Role::Fiduciary),
        ("com-1", Role::CommitteeMember),
        ("com-2", Role::CommitteeMember),
        ("com-3", Role::CommitteeMember),
        ("ben-1", Role::Beneficiary),
        ("ben-2", Role::Beneficiary),
        ("outsider", Role::Fiduciary),
        ("auditor", Role::Auditor),
    ] {
        gov.add_actor(Actor::new(id, id, role)).await.unwrap();
    }
    gov.add_actor(Actor::new("root", "root", Role::SuperAdmin)).await.unwrap();
    gov.add_actor(Actor::new("admin-fid", "admin-fid", Role::Fiduciary).with_super_admin())
        .await
        .unwrap();

    seed_trust(&gov, TRUST, requires_consensus).await;
    Arc::new(gov)
}

async fn seed_trust(gov: &Governance, trust_id: &str, requires_consensus: bool) {
    let limits = TrustLimits::new(Some(dec!(30)), Some(dec!(70))).unwrap();
    gov.create_trust(trust_id, "Fideicomiso 10045", dec!(1000000), limits, requires_consensus)
        .await
        .unwrap();

    for (id, role) in [
        ("fid-1", Role::Fiduciary),
        ("com-1", Role::CommitteeMember),
        ("com-2", Role::CommitteeMember),
        ("com-3", Role::CommitteeMember),
        ("ben-1", Role::Beneficiary),
        ("auditor", Role::Auditor),
    ] {
        gov.assign_member(id, trust_id, role).await.unwrap();
    }

    gov.set_fees(trust_id, dec!(5000), dec!(120000), true).await.unwrap();
    for month in 1..=12 {
        gov.record_monthly_payment(trust_id, 2025, month, None).await.unwrap();
    }
    for month in 1..=3 {
        gov.record_monthly_payment(trust_id, 2026, month, None).await.unwrap();
    }
}

fn bond(value: Decimal) -> RegisterAsset {
    RegisterAsset {
        trust_id: TRUST.into(),
        asset_type: AssetType::GovernmentBond,
        value_mxn: value,
        description: None,
        document_hash: None,
        beneficiary_id: None,
        loan: None,
        registered_by: "fid-1".into(),
    }
}

fn mortgage(term_years: u32) -> RegisterAsset {
    RegisterAsset {
        asset_type: AssetType::MortgageLoan,
        loan: Some(MortgageLoanData {
            price: dec!(800000),
            loan_amount: dec!(100000),
            term_years,
            monthly_payment: dec!(1200),
            has_mortgage_guarantee: true,
            has_life_insurance: true,
            has_fire_insurance: true,
            interest_rate: dec!(9),
            area_minimum_wage: dec!(100000),
            max_bond_yield_rate: Some(dec!(10)),
        }),
        ..bond(dec!(100000))
    }
}

async fn pending_bond(h: &Harness) -> String {
    h.gov.register_asset(bond(dec!(300000))).await.unwrap();
    let reg = h.gov.register_asset(bond(dec!(1))).await.unwrap();
    assert_eq!(reg.status, ComplianceStatus::PendingReview);
    reg.asset.id
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_bond_at_limit_is_compliant_one_over_is_pending() {
    let h = harness(false).await;

    let at_limit = h.gov.register_asset(bond(dec!(300000))).await.unwrap();
    assert_eq!(at_limit.status, ComplianceStatus::Compliant);
    assert!(at_limit.compliant);

    let over = h.gov.register_asset(bond(dec!(1))).await.unwrap();
    assert_eq!(over.status, ComplianceStatus::PendingReview);
    assert!(!over.compliant);
    let bond_rule = &over.validation.investment[0];
    assert_eq!(bond_rule.rule, RuleId::BondLimit);
    assert!(!bond_rule.compliant);
    assert!(over.validation.loan.is_empty());
    assert!(over.validation.prerequisites[0].compliant);
}

#[tokio::test]
async fn test_pending_assets_do_not_count_toward_limits() {
    let h = harness(false).await;

    h.gov.register_asset(bond(dec!(200000))).await.unwrap();
    let pending = h.gov.register_asset(bond(dec!(150000))).await.unwrap();
    assert_eq!(pending.status, ComplianceStatus::PendingReview);

    let next = h.gov.register_asset(bond(dec!(100000))).await.unwrap();
    assert_eq!(next.status, ComplianceStatus::Compliant);
}

#[tokio::test]
async fn test_compliant_bonds_never_exceed_limit() {
    let h = harness(false).await;
    let limit = dec!(300000);

    for value in [dec!(90000), dec!(120000), dec!(100000), dec!(60000), dec!(30000), dec!(1)] {
        h.gov.register_asset(bond(value)).await.unwrap();

        let page = h
            .gov
            .list_assets(
                TRUST,
                AssetFilter {
                    asset_type: Some(AssetType::GovernmentBond),
                    status: Some(ComplianceStatus::Compliant),
                    ..AssetFilter::default()
                },
                None,
            )
            .await
            .unwrap();
        let total: Decimal = page.assets.iter().map(|a| a.value_mxn.value()).sum();
        assert!(total <= limit, "compliant bonds {} exceed {}", total, limit);
    }
}

#[tokio::test]
async fn test_concurrent_registrations_cannot_jointly_exceed_limit() {
    let h = harness(false).await;

    let a = tokio::spawn({
        let gov = h.gov.clone();
        async move { gov.register_asset(bond(dec!(200000))).await.unwrap() }
    });
    let b = tokio::spawn({
        let gov = h.gov.clone();
        async move { gov.register_asset(bond(dec!(200000))).await.unwrap() }
    });
    let mut statuses = vec![a.await.unwrap().status, b.await.unwrap().status];
    statuses.sort_by_key(|s| s.as_str());

    assert_eq!(
        statuses,
        vec![ComplianceStatus::Compliant, ComplianceStatus::PendingReview]
    );
}

#[tokio::test]
async fn test_mortgage_term_boundaries() {
    let h = harness(false).await;

    let short = h.gov.register_asset(mortgage(9)).await.unwrap();
    assert_eq!(short.status, ComplianceStatus::NonCompliant);
    assert!(short.validation.investment.iter().all(|o| o.compliant));
    let term = short
        .validation
        .loan
        .iter()
        .find(|o| o.rule == RuleId::LoanTermRange)
        .unwrap();
    assert!(!term.compliant);

    for years in [10, 20] {
        let reg = h.gov.register_asset(mortgage(years)).await.unwrap();
        assert_eq!(reg.status, ComplianceStatus::Compliant, "term {}", years);
        assert_eq!(reg.validation.loan.len(), 5);
    }
}

#[tokio::test]
async fn test_unpaid_study_fee_blocks_registration() {
    let h = harness(false).await;
    sqlx::query("UPDATE fee_records SET study_fee_paid = 0 WHERE trust_id = ?")
        .bind(TRUST)
        .execute(h.gov.database().pool())
        .await
        .unwrap();

    let err = h.gov.register_asset(bond(dec!(1000))).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);

    let page = h.gov.list_assets(TRUST, AssetFilter::default(), None).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_missing_monthly_payment_blocks_registration() {
    let h = harness(false).await;
    sqlx::query("DELETE FROM monthly_payments WHERE trust_id = ? AND year = 2025 AND month = 7")
        .bind(TRUST)
        .execute(h.gov.database().pool())
        .await
        .unwrap();

    let err = h.gov.register_asset(bond(dec!(1000))).await.unwrap_err();
    assert!(matches!(err, GovernanceError::Precondition(_)));
}

#[tokio::test]
async fn test_registration_authorization() {
    let h = harness(false).await;

    let outsider = RegisterAsset {
        registered_by: "outsider".into(),
        ..bond(dec!(1000))
    };
    assert_eq!(
        h.gov.register_asset(outsider).await.unwrap_err().kind(),
        ErrorKind::Authorization
    );

    let auditor = RegisterAsset {
        registered_by: "auditor".into(),
        ..bond(dec!(1000))
    };
    assert_eq!(
        h.gov.register_asset(auditor).await.unwrap_err().kind(),
        ErrorKind::Authorization
    );

    // super admin skips membership but still needs a registrar role
    let root = RegisterAsset {
        registered_by: "root".into(),
        ..bond(dec!(1000))
    };
    assert_eq!(
        h.gov.register_asset(root).await.unwrap_err().kind(),
        ErrorKind::Authorization
    );
    let admin = RegisterAsset {
        registered_by: "admin-fid".into(),
        ..bond(dec!(1000))
    };
    assert!(h.gov.register_asset(admin).await.is_ok());

    let missing_trust = RegisterAsset {
        trust_id: "nope".into(),
        ..bond(dec!(1000))
    };
    assert_eq!(
        h.gov.register_asset(missing_trust).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn test_beneficiary_must_belong_to_trust() {
    let h = harness(false).await;

    let not_member = RegisterAsset {
        beneficiary_id: Some("ben-2".into()),
        ..bond(dec!(1000))
    };
    assert_eq!(
        h.gov.register_asset(not_member).await.unwrap_err().kind(),
        ErrorKind::Validation
    );

    let wrong_role = RegisterAsset {
        beneficiary_id: Some("com-1".into()),
        ..bond(dec!(1000))
    };
    assert_eq!(
        h.gov.register_asset(wrong_role).await.unwrap_err().kind(),
        ErrorKind::Validation
    );

    let page = h.gov.list_assets(TRUST, AssetFilter::default(), None).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_non_compliant_registration_side_effects() {
    let h = harness(false).await;
    let request = RegisterAsset {
        beneficiary_id: Some("ben-1".into()),
        ..mortgage(9)
    };
    let reg = h.gov.register_asset(request).await.unwrap();

    let fid_alerts = h.notifications.alerts_for("fid-1");
    assert_eq!(fid_alerts.len(), 1);
    assert_eq!(fid_alerts[0].severity, AlertSeverity::Error);
    assert_eq!(fid_alerts[0].subtype, AlertSubtype::AssetNonCompliant);
    assert_eq!(h.notifications.alerts_for("com-2").len(), 1);
    assert_eq!(h.notifications.alerts_for("ben-1")[0].severity, AlertSeverity::Warning);
    assert!(h.notifications.alerts_for("auditor").is_empty());

    let actions: Vec<_> = h.audit.entries().iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![AuditAction::AssetRegistered, AuditAction::CredentialAnchored]
    );

    let stored = h.gov.get_asset_by_id(&reg.asset.id, None).await.unwrap();
    let credential = stored.credential.unwrap();
    assert_eq!(credential.credential_id, format!("did:fidei:asset:{}", reg.asset.id));
    assert_eq!(credential.network.as_deref(), Some("local-journal"));
    assert!(credential.anchor_reference.is_some());
}

#[tokio::test]
async fn test_compliant_registration_sends_no_alerts() {
    let h = harness(false).await;
    h.gov.register_asset(bond(dec!(1000))).await.unwrap();
    assert!(h.notifications.alerts().is_empty());
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_beneficiary_visibility() {
    let h = harness(false).await;
    let linked = h
        .gov
        .register_asset(RegisterAsset {
            beneficiary_id: Some("ben-1".into()),
            ..bond(dec!(1000))
        })
        .await
        .unwrap();
    let unlinked = h.gov.register_asset(bond(dec!(2000))).await.unwrap();

    assert!(h.gov.get_asset_by_id(&linked.asset.id, Some("ben-1")).await.is_ok());
    assert_eq!(
        h.gov
            .get_asset_by_id(&unlinked.asset.id, Some("ben-1"))
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::Authorization
    );
    assert!(h.gov.get_asset_by_id(&unlinked.asset.id, Some("fid-1")).await.is_ok());

    let own = h.gov.list_assets(TRUST, AssetFilter::default(), Some("ben-1")).await.unwrap();
    assert_eq!(own.total, 1);
    assert_eq!(own.assets[0].id, linked.asset.id);

    let all = h.gov.list_assets(TRUST, AssetFilter::default(), Some("fid-1")).await.unwrap();
    assert_eq!(all.total, 2);
    assert_eq!(all.limit, 100);
    // newest first
    assert_eq!(all.assets[0].id, unlinked.asset.id);
}

#[tokio::test]
async fn test_list_paging() {
    let h = harness(false).await;
    for _ in 0..5 {
        h.gov.register_asset(bond(dec!(1000))).await.unwrap();
    }
    let page = h
        .gov
        .list_assets(
            TRUST,
            AssetFilter {
                limit: Some(2),
                offset: Some(4),
                ..AssetFilter::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.assets.len(), 1);
    assert_eq!(page.offset, 4);

    assert_eq!(
        h.gov
            .list_assets("nope", AssetFilter::default(), None)
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_across_trusts() {
    let h = file_harness(false).await;
    let trusts = ["trust-1", "trust-2", "trust-3", "trust-4"];
    for trust_id in &trusts[1..] {
        seed_trust(&h.gov, trust_id, false).await;
    }

    let mut tasks = Vec::new();
    for trust_id in trusts {
        for _ in 0..15 {
            let gov = h.gov.clone();
            tasks.push(tokio::spawn(async move {
                gov.register_asset(RegisterAsset {
                    trust_id: trust_id.into(),
                    ..bond(dec!(1))
                })
                .await
            }));
        }
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    for trust_id in trusts {
        let page = h
            .gov
            .list_assets(trust_id, AssetFilter::default(), None)
            .await
            .unwrap();
        assert_eq!(page.total, 15, "{}", trust_id);
    }
}

#[tokio::test]
async fn test_slow_side_effects_do_not_serialize_registrations() {
    let audit = Arc::new(MemoryAudit::new());
    let dispatcher = Dispatcher::new(Duration::from_millis(500)).with_subscriber(Arc::new(
        CredentialAnchoring::new(
            Arc::new(Ed25519Issuer::generate("did:fidei:issuer")),
            Arc::new(StubAnchor::Hanging(Duration::from_secs(10))),
            Arc::new(MemoryRecorder::new()),
            audit,
        ),
    ));
    let db = Database::in_memory().await.unwrap();
    let gov = seeded(Governance::new(db, RuleEngine::default(), dispatcher), false).await;

    let started = Instant::now();
    let (a, b, c) = tokio::join!(
        gov.register_asset(bond(dec!(1000))),
        gov.register_asset(bond(dec!(2000))),
        gov.register_asset(bond(dec!(3000))),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());

    // each publish waits out the subscriber timeout; the three overlap
    assert!(started.elapsed() < Duration::from_millis(1200));
}

// ============================================================================
// Single-approver mode
// ============================================================================

#[tokio::test]
async fn test_single_approval() {
    let h = harness(false).await;
    let asset_id = pending_bond(&h).await;

    let outcome = h
        .gov
        .approve_exception(&asset_id, "com-1", Some("Temporary overweight".into()))
        .await
        .unwrap();
    assert!(outcome.finalized);
    assert!(outcome.vote.is_none());
    assert_eq!(outcome.asset.compliance_status, ComplianceStatus::ExceptionApproved);
    assert!(outcome.asset.compliant);

    let stored = h.gov.get_asset_by_id(&asset_id, None).await.unwrap();
    let resolution = stored.validation.resolution.unwrap();
    assert_eq!(resolution.decision, ResolutionDecision::Approved);
    assert_eq!(resolution.decided_by.actor_id(), Some("com-1"));
    assert_eq!(resolution.reason, "Temporary overweight");
    assert!(!resolution.by_consensus);

    let alerts = h.notifications.alerts_for("fid-1");
    assert!(alerts.iter().any(|a| a.subtype == AlertSubtype::ExceptionApproved));
    assert!(h
        .audit
        .entries()
        .iter()
        .any(|e| e.action == AuditAction::ExceptionApproved));

    let again = h.gov.approve_exception(&asset_id, "com-2", None).await.unwrap_err();
    assert_eq!(again.kind(), ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_single_rejection_uses_default_reason() {
    let h = harness(false).await;
    let asset_id = pending_bond(&h).await;

    let outcome = h.gov.reject_exception(&asset_id, "com-2", None).await.unwrap();
    assert_eq!(outcome.asset.compliance_status, ComplianceStatus::NonCompliant);
    assert!(!outcome.asset.compliant);
    assert_eq!(
        outcome.asset.validation.resolution.unwrap().reason,
        "Rejected by technical committee member"
    );
}

#[tokio::test]
async fn test_only_pending_assets_can_be_decided() {
    let h = harness(false).await;
    let compliant = h.gov.register_asset(bond(dec!(1000))).await.unwrap();

    let err = h
        .gov
        .approve_exception(&compliant.asset.id, "com-1", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let err = h.gov.approve_exception("missing", "com-1", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_decision_authorization() {
    let h = harness(false).await;
    let asset_id = pending_bond(&h).await;

    let err = h.gov.approve_exception(&asset_id, "fid-1", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    // super admins decide without membership
    let outcome = h.gov.approve_exception(&asset_id, "root", None).await.unwrap();
    assert_eq!(outcome.asset.compliance_status, ComplianceStatus::ExceptionApproved);
}

#[tokio::test]
async fn test_vote_on_single_approver_trust_decides_immediately() {
    let h = harness(false).await;
    let asset_id = pending_bond(&h).await;

    let outcome = h
        .gov
        .vote_exception(&asset_id, "com-3", VoteChoice::Reject, None)
        .await
        .unwrap();
    assert!(outcome.finalized);
    assert_eq!(outcome.asset.compliance_status, ComplianceStatus::NonCompliant);

    let status = h.gov.get_voting_status(&asset_id).await.unwrap();
    assert_eq!(status.mode, GovernanceMode::Individual);
    assert_eq!(status.votes_cast, 1);
    assert_eq!(status.reject_votes, 1);
}

// ============================================================================
// Consensus mode
// ============================================================================

#[tokio::test]
async fn test_consensus_majority_approves() {
    let h = harness(true).await;
    let asset_id = pending_bond(&h).await;

    let first = h
        .gov
        .vote_exception(&asset_id, "com-1", VoteChoice::Approve, None)
        .await
        .unwrap();
    assert!(!first.finalized);
    assert_eq!(first.asset.compliance_status, ComplianceStatus::PendingReview);

    let status = h.gov.get_voting_status(&asset_id).await.unwrap();
    assert_eq!(status.mode, GovernanceMode::Consensus);
    assert_eq!(status.total_members, 3);
    assert_eq!(status.majority, 2);
    assert_eq!(status.approve_votes, 1);
    assert_eq!(status.pending_votes, 2);
    assert_eq!(status.status, ComplianceStatus::PendingReview);

    // members who have not voted are asked to
    assert!(h
        .notifications
        .alerts_for("com-2")
        .iter()
        .any(|a| a.subtype == AlertSubtype::ExceptionVote));
    assert!(h
        .notifications
        .alerts_for("com-1")
        .iter()
        .all(|a| a.subtype != AlertSubtype::ExceptionVote));

    let second = h
        .gov
        .vote_exception(&asset_id, "com-2", VoteChoice::Approve, Some("Within policy".into()))
        .await
        .unwrap();
    assert!(second.finalized);
    assert_eq!(second.asset.compliance_status, ComplianceStatus::ExceptionApproved);
    assert!(second.asset.compliant);

    let resolution = second.asset.validation.resolution.unwrap();
    assert!(resolution.by_consensus);
    assert_eq!(resolution.votes.len(), 2);
    assert_eq!(
        resolution.reason,
        "Approved by committee majority (2/3 votes in favour)"
    );

    let late = h
        .gov
        .vote_exception(&asset_id, "com-3", VoteChoice::Reject, None)
        .await
        .unwrap_err();
    assert_eq!(late.kind(), ErrorKind::InvalidState);

    let status = h.gov.get_voting_status(&asset_id).await.unwrap();
    assert_eq!(status.votes_cast, 2);
    assert_eq!(status.status, ComplianceStatus::ExceptionApproved);

    assert!(h
        .notifications
        .alerts_for("fid-1")
        .iter()
        .any(|a| a.subtype == AlertSubtype::ExceptionApproved));
}

#[tokio::test]
async fn test_consensus_majority_rejects() {
    let h = harness(true).await;
    let asset_id = pending_bond(&h).await;

    h.gov
        .vote_exception(&asset_id, "com-1", VoteChoice::Reject, None)
        .await
        .unwrap();
    h.gov
        .vote_exception(&asset_id, "com-2", VoteChoice::Approve, None)
        .await
        .unwrap();
    let third = h
        .gov
        .reject_exception(&asset_id, "com-3", Some("Too concentrated".into()))
        .await
        .unwrap();

    assert!(third.finalized);
    assert_eq!(third.asset.compliance_status, ComplianceStatus::NonCompliant);
    assert!(!third.asset.compliant);
    assert_eq!(third.vote.unwrap().reason, "Too concentrated");
    assert_eq!(third.asset.validation.resolution.unwrap().votes.len(), 3);
}

#[tokio::test]
async fn test_duplicate_vote_leaves_tally_unchanged() {
    let h = harness(true).await;
    let asset_id = pending_bond(&h).await;

    h.gov
        .vote_exception(&asset_id, "com-1", VoteChoice::Approve, None)
        .await
        .unwrap();
    let before = h.gov.get_voting_status(&asset_id).await.unwrap();

    let err = h
        .gov
        .vote_exception(&asset_id, "com-1", VoteChoice::Reject, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GovernanceError::DuplicateVote { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let after = h.gov.get_voting_status(&asset_id).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_voting_status_is_idempotent() {
    let h = harness(true).await;
    let asset_id = pending_bond(&h).await;
    h.gov
        .vote_exception(&asset_id, "com-2", VoteChoice::Reject, None)
        .await
        .unwrap();

    let first = h.gov.get_voting_status(&asset_id).await.unwrap();
    let second = h.gov.get_voting_status(&asset_id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.votes[0].reason, "Rejected by technical committee member");
}

#[tokio::test]
async fn test_only_committee_members_vote() {
    let h = harness(true).await;
    let asset_id = pending_bond(&h).await;

    let err = h
        .gov
        .vote_exception(&asset_id, "fid-1", VoteChoice::Approve, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    h.gov.remove_member("com-3", TRUST).await.unwrap();
    let err = h
        .gov
        .vote_exception(&asset_id, "com-3", VoteChoice::Approve, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    // committee shrank to two: one vote is a majority
    let outcome = h
        .gov
        .vote_exception(&asset_id, "com-1", VoteChoice::Approve, None)
        .await
        .unwrap();
    assert!(outcome.finalized);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_finalizing_votes_resolve_once() {
    let h = file_harness(true).await;
    let asset_id = pending_bond(&h).await;
    h.gov
        .vote_exception(&asset_id, "com-1", VoteChoice::Approve, None)
        .await
        .unwrap();

    // a second service over the same file shares no in-process locks
    let other = Arc::new(
        Governance::new(
            h.gov.database().clone(),
            RuleEngine::default(),
            Dispatcher::new(Duration::from_secs(2)),
        )
        .with_clock(Arc::new(FixedClock(today()))),
    );

    let first = {
        let gov = h.gov.clone();
        let asset_id = asset_id.clone();
        tokio::spawn(async move {
            gov.vote_exception(&asset_id, "com-2", VoteChoice::Approve, None)
                .await
        })
    };
    let second = {
        let asset_id = asset_id.clone();
        tokio::spawn(async move {
            other
                .vote_exception(&asset_id, "com-3", VoteChoice::Approve, None)
                .await
        })
    };
    let results = [first.await.unwrap(), second.await.unwrap()];

    let finalized = results
        .iter()
        .filter(|r| matches!(r, Ok(outcome) if outcome.finalized))
        .count();
    assert_eq!(finalized, 1);
    let failed: Vec<&GovernanceError> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].kind(), ErrorKind::InvalidState);

    let status = h.gov.get_voting_status(&asset_id).await.unwrap();
    assert_eq!(status.votes_cast, 2);
    assert_eq!(status.status, ComplianceStatus::ExceptionApproved);
}
