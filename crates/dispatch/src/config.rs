//! Dispatch configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Upper bound for a single subscriber call
    #[serde(default = "default_subscriber_timeout_ms")]
    pub subscriber_timeout_ms: u64,

    /// DID used as credential issuer
    #[serde(default = "default_issuer_did")]
    pub issuer_did: String,

    /// Directory of the anchor journal
    #[serde(default = "default_anchor_dir")]
    pub anchor_dir: PathBuf,
}

fn default_subscriber_timeout_ms() -> u64 {
    2000
}

fn default_issuer_did() -> String {
    "did:fidei:issuer".to_string()
}

fn default_anchor_dir() -> PathBuf {
    PathBuf::from("./data/anchors")
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            subscriber_timeout_ms: default_subscriber_timeout_ms(),
            issuer_did: default_issuer_did(),
            anchor_dir: default_anchor_dir(),
        }
    }
}

impl DispatchConfig {
    pub fn subscriber_timeout(&self) -> Duration {
        Duration::from_millis(self.subscriber_timeout_ms)
    }
}
