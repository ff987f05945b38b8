//! Audit trail subscriber

use crate::audit::{AuditAction, AuditEntry, AuditSink};
use crate::error::DispatchResult;
use crate::event::DomainEvent;
use crate::subscriber::EventSubscriber;
use async_trait::async_trait;
use fidei_core::{ActorRef, ResolutionDecision};
use serde_json::json;
use std::sync::Arc;

pub struct AuditTrail {
    sink: Arc<dyn AuditSink>,
}

impl AuditTrail {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub fn entry_for(event: &DomainEvent) -> AuditEntry {
        match event {
            DomainEvent::AssetRegistered { asset, .. } => AuditEntry::asset(
                ActorRef::human(&asset.registered_by),
                AuditAction::AssetRegistered,
                &asset.id,
                &asset.trust_id,
                json!({
                    "asset_type": asset.asset_type,
                    "value_mxn": asset.value_mxn,
                    "compliance_status": asset.compliance_status,
                    "compliant": asset.compliant,
                    "beneficiary_id": asset.beneficiary_id,
                    "failing_rules": asset.validation.failing_messages(),
                }),
            ),
            DomainEvent::ExceptionResolved {
                asset,
                decision,
                decided_by,
                reason,
                by_consensus,
                ..
            } => {
                let action = match decision {
                    ResolutionDecision::Approved => AuditAction::ExceptionApproved,
                    ResolutionDecision::Rejected => AuditAction::ExceptionRejected,
                };
                AuditEntry::asset(
                    decided_by.clone(),
                    action,
                    &asset.id,
                    &asset.trust_id,
                    json!({
                        "reason": reason,
                        "by_consensus": by_consensus,
                        "compliance_status": asset.compliance_status,
                    }),
                )
            }
            DomainEvent::ExceptionVoteCast {
                asset_id,
                trust_id,
                voter_id,
                choice,
                tally,
                finalized,
                ..
            } => AuditEntry::asset(
                ActorRef::human(voter_id),
                AuditAction::ExceptionVoteCast,
                asset_id,
                trust_id,
                json!({
                    "choice": choice,
                    "approve_votes": tally.approve,
                    "reject_votes": tally.reject,
                    "majority": tally.majority,
                    "total_members": tally.total_members,
                    "finalized": finalized,
                }),
            ),
        }
    }
}

#[async_trait]
impl EventSubscriber for AuditTrail {
    fn name(&self) -> &str {
        "audit"
    }

    async fn handle(&self, event: &DomainEvent) -> DispatchResult<()> {
        self.sink.create_audit_log(Self::entry_for(event)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::tests::{sample_asset, sample_trust};
    use crate::event::Audience;
    use crate::memory::MemoryAudit;
    use fidei_core::ComplianceStatus;

    #[tokio::test]
    async fn test_registration_audited_as_registrar() {
        let sink = Arc::new(MemoryAudit::new());
        let trail = AuditTrail::new(sink.clone());
        let event = DomainEvent::AssetRegistered {
            trust: sample_trust(),
            asset: sample_asset(ComplianceStatus::Compliant),
            audience: Audience::default(),
        };

        trail.handle(&event).await.unwrap();
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::AssetRegistered);
        assert_eq!(entries[0].actor, ActorRef::human("actor-1"));
        assert_eq!(entries[0].entity_type, "Asset");
        assert_eq!(entries[0].details["compliance_status"], "COMPLIANT");
    }

    #[test]
    fn test_rejection_action() {
        let event = DomainEvent::ExceptionResolved {
            asset: sample_asset(ComplianceStatus::NonCompliant),
            decision: ResolutionDecision::Rejected,
            decided_by: ActorRef::human("member-1"),
            reason: "too concentrated".into(),
            by_consensus: false,
            audience: Audience::default(),
        };
        let entry = AuditTrail::entry_for(&event);
        assert_eq!(entry.action, AuditAction::ExceptionRejected);
        assert_eq!(entry.details["reason"], "too concentrated");
    }
}
