//! Event subscriber trait for post-commit side effects

use crate::error::DispatchResult;
use crate::event::DomainEvent;
use async_trait::async_trait;
use fidei_core::CredentialAnchor;

/// Receives committed domain events.
///
/// Failures are logged by the dispatcher and never reach the caller that
/// produced the event.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Subscriber name (for logging)
    fn name(&self) -> &str;

    async fn handle(&self, event: &DomainEvent) -> DispatchResult<()>;
}

/// Writes anchoring results back onto the asset
#[async_trait]
pub trait CredentialRecorder: Send + Sync {
    async fn record_credential(&self, asset_id: &str, credential: &CredentialAnchor) -> DispatchResult<()>;
}
