//! Bounded post-commit dispatcher

use crate::event::DomainEvent;
use crate::subscriber::EventSubscriber;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// What happened to one published event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    /// (subscriber, reason)
    pub failed: Vec<(String, String)>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Hands committed events to every subscriber in registration order.
///
/// Each call is bounded by the configured timeout. Failures and timeouts
/// are logged and reported, never returned as errors.
pub struct Dispatcher {
    subscribers: Vec<Arc<dyn EventSubscriber>>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            subscribers: Vec::new(),
            timeout,
        }
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn EventSubscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    pub fn subscribe(&mut self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn subscriber_names(&self) -> Vec<String> {
        self.subscribers.iter().map(|s| s.name().to_string()).collect()
    }

    pub async fn publish(&self, event: &DomainEvent) -> DispatchReport {
        let mut report = DispatchReport::default();

        for subscriber in &self.subscribers {
            let name = subscriber.name().to_string();
            match tokio::time::timeout(self.timeout, subscriber.handle(event)).await {
                Ok(Ok(())) => {
                    debug!(subscriber = %name, event = event.name(), "Event delivered");
                    report.delivered.push(name);
                }
                Ok(Err(e)) => {
                    error!(
                        subscriber = %name,
                        event = event.name(),
                        asset_id = event.asset_id(),
                        error = %e,
                        "Side effect failed"
                    );
                    report.failed.push((name, e.to_string()));
                }
                Err(_) => {
                    error!(
                        subscriber = %name,
                        event = event.name(),
                        asset_id = event.asset_id(),
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Side effect timed out"
                    );
                    report.failed.push((name, "timed out".to_string()));
                }
            }
        }

        report
    }
}
