//! Alert fan-out for compliance events

use crate::alert::{Alert, AlertSeverity, AlertSubtype, NotificationSink};
use crate::error::{DispatchError, DispatchResult};
use crate::event::DomainEvent;
use crate::subscriber::EventSubscriber;
use async_trait::async_trait;
use fidei_core::{Asset, ResolutionDecision};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// Turns domain events into per-recipient alerts
pub struct AlertFanout {
    sink: Arc<dyn NotificationSink>,
}

/// Recipients in delivery order, each at most once
#[derive(Default)]
struct Recipients {
    seen: HashSet<String>,
    list: Vec<(String, AlertSeverity)>,
}

impl Recipients {
    fn add<'a>(&mut self, ids: impl IntoIterator<Item = &'a String>, severity: AlertSeverity) {
        for id in ids {
            if self.seen.insert(id.clone()) {
                self.list.push((id.clone(), severity));
            }
        }
    }
}

impl AlertFanout {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Alerts produced for an event, without sending them
    pub fn alerts_for(event: &DomainEvent) -> Vec<Alert> {
        match event {
            DomainEvent::AssetRegistered { asset, audience, .. } => {
                if asset.compliance_status.is_compliant() {
                    return Vec::new();
                }
                let mut to = Recipients::default();
                to.add(&audience.trustees, AlertSeverity::Error);
                to.add(&audience.committee, AlertSeverity::Warning);
                to.add(asset.beneficiary_id.iter(), AlertSeverity::Warning);

                let message = non_compliant_message(asset);
                to.list
                    .into_iter()
                    .map(|(id, severity)| {
                        Alert::compliance(id, AlertSubtype::AssetNonCompliant, severity, message.clone())
                            .for_asset(&asset.trust_id, &asset.id)
                    })
                    .collect()
            }
            DomainEvent::ExceptionResolved {
                asset,
                decision,
                reason,
                by_consensus,
                audience,
                ..
            } => {
                let (subtype, severity, verb) = match decision {
                    ResolutionDecision::Approved => {
                        (AlertSubtype::ExceptionApproved, AlertSeverity::Info, "approved")
                    }
                    ResolutionDecision::Rejected => {
                        (AlertSubtype::ExceptionRejected, AlertSeverity::Warning, "rejected")
                    }
                };
                let message = format!(
                    "Exception for {} asset {} was {}: {}",
                    asset.asset_type, asset.id, verb, reason
                );

                let mut to = Recipients::default();
                to.add(std::iter::once(&asset.registered_by), severity);
                to.add(asset.beneficiary_id.iter(), severity);
                if *by_consensus {
                    to.add(&audience.trustees, severity);
                }
                to.list
                    .into_iter()
                    .map(|(id, severity)| {
                        Alert::compliance(id, subtype, severity, message.clone())
                            .for_asset(&asset.trust_id, &asset.id)
                    })
                    .collect()
            }
            DomainEvent::ExceptionVoteCast {
                asset_id,
                trust_id,
                tally,
                finalized,
                awaiting,
                ..
            } => {
                let (severity, message) = if *finalized {
                    (
                        AlertSeverity::Info,
                        format!(
                            "Exception for asset {} was decided by majority; your vote is no longer needed",
                            asset_id
                        ),
                    )
                } else {
                    (
                        AlertSeverity::Warning,
                        format!(
                            "Your vote is needed on the exception for asset {} ({} approve, {} reject, {} needed)",
                            asset_id, tally.approve, tally.reject, tally.majority
                        ),
                    )
                };
                let mut to = Recipients::default();
                to.add(awaiting, severity);
                to.list
                    .into_iter()
                    .map(|(id, severity)| {
                        Alert::compliance(id, AlertSubtype::ExceptionVote, severity, message.clone())
                            .for_asset(trust_id, asset_id)
                    })
                    .collect()
            }
        }
    }
}

fn non_compliant_message(asset: &Asset) -> String {
    let failing = asset.validation.failing_messages();
    if failing.is_empty() {
        format!("Asset {} registered as {}", asset.id, asset.compliance_status)
    } else {
        format!(
            "Asset {} registered as {}: {}",
            asset.id,
            asset.compliance_status,
            failing.join("; ")
        )
    }
}

#[async_trait]
impl EventSubscriber for AlertFanout {
    fn name(&self) -> &str {
        "alerts"
    }

    async fn handle(&self, event: &DomainEvent) -> DispatchResult<()> {
        let mut failed = 0usize;
        let mut last_error = None;
        for alert in Self::alerts_for(event) {
            let recipient = alert.recipient_id.clone();
            if let Err(e) = self.sink.create_alert(alert).await {
                warn!(recipient = %recipient, error = %e, "Alert delivery failed");
                failed += 1;
                last_error = Some(e);
            }
        }

        match last_error {
            None => Ok(()),
            Some(e) => Err(DispatchError::sink(
                self.sink.name(),
                format!("{} alert(s) not delivered, last error: {}", failed, e),
            )),
        }
    }
}
