//! SQLite-backed sinks for the dispatcher

use async_trait::async_trait;
use fidei_core::CredentialAnchor;
use fidei_dispatch::{
    Alert, AuditEntry, AuditSink, CredentialRecorder, DispatchError, DispatchResult, NotificationSink,
};
use fidei_store::{AlertRepo, AssetRepo, AuditRepo, AlertRow, AuditRow, Database};

pub struct SqliteNotifications {
    db: Database,
}

impl SqliteNotifications {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationSink for SqliteNotifications {
    fn name(&self) -> &str {
        "sqlite-alerts"
    }

    async fn create_alert(&self, alert: Alert) -> DispatchResult<()> {
        let row = AlertRow {
            id: alert.id,
            recipient_id: alert.recipient_id,
            trust_id: alert.trust_id,
            asset_id: alert.asset_id,
            alert_type: alert.alert_type.as_str().to_string(),
            subtype: alert.subtype.as_str().to_string(),
            severity: alert.severity.as_str().to_string(),
            message: alert.message,
            is_read: false,
            created_at: alert.created_at,
        };
        AlertRepo::insert(self.db.pool(), &row)
            .await
            .map_err(|e| DispatchError::sink(self.name(), e))
    }
}

pub struct SqliteAudit {
    db: Database,
}

impl SqliteAudit {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditSink for SqliteAudit {
    fn name(&self) -> &str {
        "sqlite-audit"
    }

    async fn create_audit_log(&self, entry: AuditEntry) -> DispatchResult<()> {
        let row = AuditRow {
            id: entry.id,
            actor_id: entry.actor.actor_id().map(str::to_string),
            action: entry.action.as_str().to_string(),
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            trust_id: entry.trust_id,
            details: serde_json::to_string(&entry.details)?,
            created_at: entry.created_at,
        };
        AuditRepo::insert(self.db.pool(), &row)
            .await
            .map_err(|e| DispatchError::sink(self.name(), e))
    }
}

pub struct SqliteCredentialRecorder {
    db: Database,
}

impl SqliteCredentialRecorder {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialRecorder for SqliteCredentialRecorder {
    async fn record_credential(&self, asset_id: &str, credential: &CredentialAnchor) -> DispatchResult<()> {
        AssetRepo::record_credential(self.db.pool(), asset_id, credential)
            .await
            .map_err(|e| DispatchError::sink("sqlite-credentials", e))
    }
}
