//! Alerts and the notification sink

use crate::error::DispatchResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    Compliance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSubtype {
    AssetNonCompliant,
    ExceptionApproved,
    ExceptionRejected,
    ExceptionVote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
}

macro_rules! upper_name {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }
    };
}

upper_name!(AlertType { Compliance => "COMPLIANCE" });
upper_name!(AlertSubtype {
    AssetNonCompliant => "ASSET_NON_COMPLIANT",
    ExceptionApproved => "EXCEPTION_APPROVED",
    ExceptionRejected => "EXCEPTION_REJECTED",
    ExceptionVote => "EXCEPTION_VOTE",
});
upper_name!(AlertSeverity {
    Info => "INFO",
    Warning => "WARNING",
    Error => "ERROR",
});

/// A message for one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub recipient_id: String,
    pub trust_id: Option<String>,
    pub asset_id: Option<String>,
    pub alert_type: AlertType,
    pub subtype: AlertSubtype,
    pub severity: AlertSeverity,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn compliance(
        recipient_id: impl Into<String>,
        subtype: AlertSubtype,
        severity: AlertSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            recipient_id: recipient_id.into(),
            trust_id: None,
            asset_id: None,
            alert_type: AlertType::Compliance,
            subtype,
            severity,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn for_asset(mut self, trust_id: impl Into<String>, asset_id: impl Into<String>) -> Self {
        self.trust_id = Some(trust_id.into());
        self.asset_id = Some(asset_id.into());
        self
    }
}

/// Where alerts are delivered
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &str;

    async fn create_alert(&self, alert: Alert) -> DispatchResult<()>;
}
