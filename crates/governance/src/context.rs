//! Service context - wires store, rules and dispatch together

use crate::adapters::{SqliteAudit, SqliteCredentialRecorder, SqliteNotifications};
use crate::clock::{Clock, SystemClock};
use crate::locks::KeyedLocks;
use fidei_dispatch::{
    AlertFanout, AuditTrail, CredentialAnchoring, CredentialIssuer, DispatchConfig, DispatchResult,
    Dispatcher, DomainEvent, JournalAnchor,
};
use fidei_rules::{RuleEngine, RulesConfig};
use fidei_store::Database;
use std::sync::Arc;

/// Entry point for every governance operation.
///
/// Cheap to share behind an `Arc`; each call is an independent request.
pub struct Governance {
    pub(crate) db: Database,
    pub(crate) engine: RuleEngine,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) locks: KeyedLocks,
    pub(crate) clock: Arc<dyn Clock>,
}

impl Governance {
    pub fn new(db: Database, engine: RuleEngine, dispatcher: Dispatcher) -> Self {
        Self {
            db,
            engine,
            dispatcher,
            locks: KeyedLocks::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Alerts and audit in SQLite, credentials anchored in the journal under
    /// `dispatch.anchor_dir`.
    pub fn with_sqlite_sinks(
        db: Database,
        rules: RulesConfig,
        dispatch: &DispatchConfig,
        issuer: Arc<dyn CredentialIssuer>,
    ) -> DispatchResult<Self> {
        let notifications = Arc::new(SqliteNotifications::new(db.clone()));
        let audit = Arc::new(SqliteAudit::new(db.clone()));
        let recorder = Arc::new(SqliteCredentialRecorder::new(db.clone()));
        let anchor = Arc::new(JournalAnchor::in_dir(&dispatch.anchor_dir)?);

        let dispatcher = Dispatcher::new(dispatch.subscriber_timeout())
            .with_subscriber(Arc::new(AlertFanout::new(notifications)))
            .with_subscriber(Arc::new(AuditTrail::new(audit.clone())))
            .with_subscriber(Arc::new(CredentialAnchoring::new(issuer, anchor, recorder, audit)));

        Ok(Self::new(db, RuleEngine::new(rules), dispatcher))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Publish committed events; failures end in the log
    pub(crate) async fn publish(&self, events: &[DomainEvent]) {
        for event in events {
            self.dispatcher.publish(event).await;
        }
    }
}
