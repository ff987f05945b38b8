//! Fidei Dispatch - side effects that run after a commit
//!
//! Services commit their state change first, then publish a [`DomainEvent`].
//! The [`Dispatcher`] hands the event to each subscriber under a timeout:
//!
//! ```text
//! commit ──► DomainEvent ──► Dispatcher ──┬──► AlertFanout        ──► NotificationSink
//!                                         ├──► AuditTrail         ──► AuditSink
//!                                         └──► CredentialAnchoring ──► CredentialIssuer
//!                                                                  ──► LedgerAnchor
//!                                                                  ──► CredentialRecorder
//! ```
//!
//! A failing or slow subscriber is logged and skipped; it never undoes the
//! committed change.

pub mod alert;
pub mod anchor;
pub mod anchoring;
pub mod audit;
pub mod config;
pub mod credential;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod fanout;
pub mod memory;
pub mod subscriber;
pub mod trail;

pub use alert::{Alert, AlertSeverity, AlertSubtype, AlertType, NotificationSink};
pub use anchor::{AnchorReceipt, JournalAnchor, JournalLine, LedgerAnchor, JOURNAL_NETWORK};
pub use anchoring::CredentialAnchoring;
pub use audit::{AuditAction, AuditEntry, AuditSink};
pub use config::DispatchConfig;
pub use credential::{CredentialIssuer, Ed25519Issuer, VerifiableCredential};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use error::{DispatchError, DispatchResult};
pub use event::{Audience, DomainEvent, TallySnapshot};
pub use fanout::AlertFanout;
pub use subscriber::{CredentialRecorder, EventSubscriber};
pub use trail::AuditTrail;
