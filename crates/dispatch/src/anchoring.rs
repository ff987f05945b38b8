//! Credential issuing and anchoring after registration

use crate::anchor::LedgerAnchor;
use crate::audit::{AuditAction, AuditEntry, AuditSink};
use crate::credential::CredentialIssuer;
use crate::error::{DispatchError, DispatchResult};
use crate::event::DomainEvent;
use crate::subscriber::{CredentialRecorder, EventSubscriber};
use async_trait::async_trait;
use chrono::Utc;
use fidei_core::{ActorRef, CredentialAnchor};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Issues a credential for each new asset and anchors its hash.
///
/// The anchor reference is written back through the recorder only when the
/// ledger accepted the hash.
pub struct CredentialAnchoring {
    issuer: Arc<dyn CredentialIssuer>,
    anchor: Arc<dyn LedgerAnchor>,
    recorder: Arc<dyn CredentialRecorder>,
    audit: Arc<dyn AuditSink>,
}

impl CredentialAnchoring {
    pub fn new(
        issuer: Arc<dyn CredentialIssuer>,
        anchor: Arc<dyn LedgerAnchor>,
        recorder: Arc<dyn CredentialRecorder>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            issuer,
            anchor,
            recorder,
            audit,
        }
    }
}

#[async_trait]
impl EventSubscriber for CredentialAnchoring {
    fn name(&self) -> &str {
        "credentials"
    }

    async fn handle(&self, event: &DomainEvent) -> DispatchResult<()> {
        let DomainEvent::AssetRegistered { trust, asset, .. } = event else {
            return Ok(());
        };

        let credential = self.issuer.issue(asset, trust)?;
        let hash = credential.hash()?;
        let receipt = self
            .anchor
            .anchor(
                &hash,
                json!({
                    "credential_id": credential.id,
                    "asset_id": asset.id,
                    "trust_id": trust.id,
                }),
            )
            .await?;

        if !receipt.success {
            let reason = receipt.error.unwrap_or_else(|| "unknown error".to_string());
            warn!(asset_id = %asset.id, network = %receipt.network, reason = %reason, "Credential not anchored");
            return Err(DispatchError::AnchorFailed(reason));
        }

        let anchored = CredentialAnchor {
            credential_id: credential.id.clone(),
            credential_hash: hash,
            anchor_reference: receipt.reference,
            network: Some(receipt.network),
            anchored_at: Some(Utc::now()),
        };
        self.recorder.record_credential(&asset.id, &anchored).await?;
        info!(
            asset_id = %asset.id,
            reference = anchored.anchor_reference.as_deref().unwrap_or_default(),
            "Credential anchored"
        );

        self.audit
            .create_audit_log(AuditEntry::asset(
                ActorRef::System,
                AuditAction::CredentialAnchored,
                &asset.id,
                &asset.trust_id,
                json!({
                    "credential_id": anchored.credential_id,
                    "credential_hash": anchored.credential_hash,
                    "anchor_reference": anchored.anchor_reference,
                    "network": anchored.network,
                }),
            ))
            .await
    }
}
