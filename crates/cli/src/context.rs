//! Application context - opens the database and wires the services

use crate::config::AppConfig;
use fidei_dispatch::{CredentialIssuer, Ed25519Issuer};
use fidei_governance::Governance;
use fidei_store::Database;
use std::sync::Arc;
use tracing::{info, warn};

pub struct AppContext {
    pub config: AppConfig,
    pub gov: Governance,
}

impl AppContext {
    pub async fn new(config: AppConfig) -> Result<Self, anyhow::Error> {
        std::fs::create_dir_all(&config.data_dir)?;

        let db = match config.database_url {
            Some(ref url) => Database::connect(url).await?,
            None => Database::open(config.database_path()).await?,
        };

        let issuer = load_issuer(&config)?;
        info!(issuer = %issuer.issuer_did(), "Credential issuer ready");

        let gov = Governance::with_sqlite_sinks(db, config.rules.clone(), &config.dispatch, issuer)?;
        Ok(Self { config, gov })
    }
}

/// Key from config/env, then the keygen file, else an ephemeral key
fn load_issuer(config: &AppConfig) -> Result<Arc<dyn CredentialIssuer>, anyhow::Error> {
    let did = config.dispatch.issuer_did.clone();

    if let Some(ref seed) = config.issuer_key {
        return Ok(Arc::new(Ed25519Issuer::from_hex(did, seed)?));
    }

    let key_path = config.issuer_key_path();
    if key_path.exists() {
        let seed = std::fs::read_to_string(&key_path)?;
        return Ok(Arc::new(Ed25519Issuer::from_hex(did, &seed)?));
    }

    warn!("No issuer key configured; credentials are signed with an ephemeral key");
    Ok(Arc::new(Ed25519Issuer::generate(did)))
}
