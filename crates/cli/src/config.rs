//! Application configuration
//!
//! Loaded from an optional JSON file; every field has a default. The
//! environment overrides the database URL and the issuer key.

use fidei_dispatch::DispatchConfig;
use fidei_rules::RulesConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_DATABASE_URL: &str = "FIDEI_DATABASE_URL";
pub const ENV_ISSUER_KEY: &str = "FIDEI_ISSUER_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite URL; `<data_dir>/fidei.db` when absent
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Hex Ed25519 seed used to sign credentials
    #[serde(default, skip_serializing)]
    pub issuer_key: Option<String>,

    #[serde(default)]
    pub rules: RulesConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            data_dir: default_data_dir(),
            issuer_key: None,
            rules: RulesConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read the config file (if any) and apply environment overrides
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {}", path.display(), e))?;
        let config = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in `load`)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_DATABASE_URL).filter(|v| !v.is_empty()) {
            self.database_url = Some(url);
        }
        if let Some(key) = lookup(ENV_ISSUER_KEY).filter(|v| !v.is_empty()) {
            self.issuer_key = Some(key);
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("fidei.db")
    }

    /// Key file written by `fidei keygen`
    pub fn issuer_key_path(&self) -> PathBuf {
        self.data_dir.join("issuer.key")
    }
}
