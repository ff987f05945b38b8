//! In-memory sinks for tests and dry runs

use crate::alert::{Alert, NotificationSink};
use crate::anchor::{AnchorReceipt, LedgerAnchor};
use crate::audit::{AuditEntry, AuditSink};
use crate::error::{DispatchError, DispatchResult};
use crate::subscriber::CredentialRecorder;
use async_trait::async_trait;
use fidei_core::CredentialAnchor;
use std::sync::Mutex;
use std::time::Duration;

fn snapshot<T: Clone>(items: &Mutex<Vec<T>>) -> Vec<T> {
    items.lock().map(|v| v.clone()).unwrap_or_default()
}

fn push<T>(name: &str, items: &Mutex<Vec<T>>, item: T) -> DispatchResult<()> {
    items
        .lock()
        .map_err(|_| DispatchError::sink(name, "lock poisoned"))?
        .push(item);
    Ok(())
}

/// Collects alerts; can be told to fail every call
#[derive(Default)]
pub struct MemoryNotifications {
    alerts: Mutex<Vec<Alert>>,
    failing: bool,
}

impl MemoryNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn alerts(&self) -> Vec<Alert> {
        snapshot(&self.alerts)
    }

    pub fn alerts_for(&self, recipient_id: &str) -> Vec<Alert> {
        self.alerts()
            .into_iter()
            .filter(|a| a.recipient_id == recipient_id)
            .collect()
    }
}

#[async_trait]
impl NotificationSink for MemoryNotifications {
    fn name(&self) -> &str {
        "memory-notifications"
    }

    async fn create_alert(&self, alert: Alert) -> DispatchResult<()> {
        if self.failing {
            return Err(DispatchError::sink(self.name(), "notification service unavailable"));
        }
        push(self.name(), &self.alerts, alert)
    }
}

#[derive(Default)]
pub struct MemoryAudit {
    entries: Mutex<Vec<AuditEntry>>,
    failing: bool,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        snapshot(&self.entries)
    }
}

#[async_trait]
impl AuditSink for MemoryAudit {
    fn name(&self) -> &str {
        "memory-audit"
    }

    async fn create_audit_log(&self, entry: AuditEntry) -> DispatchResult<()> {
        if self.failing {
            return Err(DispatchError::sink(self.name(), "audit store unavailable"));
        }
        push(self.name(), &self.entries, entry)
    }
}

/// Remembers recorded credentials by asset id
#[derive(Default)]
pub struct MemoryRecorder {
    records: Mutex<Vec<(String, CredentialAnchor)>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(String, CredentialAnchor)> {
        snapshot(&self.records)
    }
}

#[async_trait]
impl CredentialRecorder for MemoryRecorder {
    async fn record_credential(&self, asset_id: &str, credential: &CredentialAnchor) -> DispatchResult<()> {
        push("memory-recorder", &self.records, (asset_id.to_string(), credential.clone()))
    }
}

/// Anchor that never answers in time or always refuses
pub enum StubAnchor {
    Unreachable,
    Hanging(Duration),
}

#[async_trait]
impl LedgerAnchor for StubAnchor {
    fn network(&self) -> &str {
        "stub"
    }

    async fn anchor(&self, _hash: &str, _metadata: serde_json::Value) -> DispatchResult<AnchorReceipt> {
        match self {
            StubAnchor::Unreachable => Ok(AnchorReceipt::failed("stub", "ledger unreachable")),
            StubAnchor::Hanging(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(AnchorReceipt::anchored("late", "stub"))
            }
        }
    }
}
