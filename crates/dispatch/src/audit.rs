//! Audit entries and the audit sink

use crate::error::DispatchResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fidei_core::ActorRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    AssetRegistered,
    ExceptionApproved,
    ExceptionRejected,
    ExceptionVoteCast,
    CredentialAnchored,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::AssetRegistered => "ASSET_REGISTERED",
            AuditAction::ExceptionApproved => "EXCEPTION_APPROVED",
            AuditAction::ExceptionRejected => "EXCEPTION_REJECTED",
            AuditAction::ExceptionVoteCast => "EXCEPTION_VOTE_CAST",
            AuditAction::CredentialAnchored => "CREDENTIAL_ANCHORED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub actor: ActorRef,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub trust_id: Option<String>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Audit entry about an asset
    pub fn asset(
        actor: ActorRef,
        action: AuditAction,
        asset_id: impl Into<String>,
        trust_id: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            actor,
            action,
            entity_type: "Asset".to_string(),
            entity_id: asset_id.into(),
            trust_id: Some(trust_id.into()),
            details,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    fn name(&self) -> &str;

    async fn create_audit_log(&self, entry: AuditEntry) -> DispatchResult<()>;
}
