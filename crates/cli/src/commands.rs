//! CLI commands
//!
//! Every command returns the JSON document printed by the binary.

use fidei_core::{
    Actor, AssetType, ComplianceStatus, MortgageLoanData, Role, TrustLimits, VoteChoice,
};
use fidei_dispatch::Ed25519Issuer;
use fidei_governance::{AssetFilter, RegisterAsset};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;

use crate::config::AppConfig;
use crate::context::AppContext;

fn to_json<T: Serialize>(value: &T) -> Result<Value, anyhow::Error> {
    Ok(serde_json::to_value(value)?)
}

/// Open (and migrate) the database under the configured data directory
pub async fn init(ctx: &AppContext) -> Result<Value, anyhow::Error> {
    let config = &ctx.config;
    Ok(json!({
        "data_dir": config.data_dir,
        "database": config
            .database_url
            .clone()
            .unwrap_or_else(|| config.database_path().display().to_string()),
        "anchor_dir": config.dispatch.anchor_dir,
        "issuer": config.dispatch.issuer_did,
    }))
}

pub async fn create_trust(
    ctx: &AppContext,
    id: &str,
    name: &str,
    initial_capital: Decimal,
    bond_limit: Option<Decimal>,
    other_limit: Option<Decimal>,
    requires_consensus: bool,
) -> Result<Value, anyhow::Error> {
    let limits = TrustLimits::new(bond_limit, other_limit)?;
    let trust = ctx
        .gov
        .create_trust(id, name, initial_capital, limits, requires_consensus)
        .await?;
    to_json(&trust)
}

pub async fn add_actor(
    ctx: &AppContext,
    id: &str,
    name: &str,
    role: Role,
    super_admin: bool,
) -> Result<Value, anyhow::Error> {
    let mut actor = Actor::new(id, name, role);
    if super_admin {
        actor = actor.with_super_admin();
    }
    to_json(&ctx.gov.add_actor(actor).await?)
}

pub async fn assign_member(
    ctx: &AppContext,
    actor_id: &str,
    trust_id: &str,
    role: Role,
) -> Result<Value, anyhow::Error> {
    to_json(&ctx.gov.assign_member(actor_id, trust_id, role).await?)
}

pub async fn remove_member(ctx: &AppContext, actor_id: &str, trust_id: &str) -> Result<Value, anyhow::Error> {
    ctx.gov.remove_member(actor_id, trust_id).await?;
    Ok(json!({ "actor_id": actor_id, "trust_id": trust_id, "active": false }))
}

pub async fn set_fees(
    ctx: &AppContext,
    trust_id: &str,
    study_fee_amount: Decimal,
    annual_fee: Decimal,
    paid: bool,
) -> Result<Value, anyhow::Error> {
    to_json(&ctx.gov.set_fees(trust_id, study_fee_amount, annual_fee, paid).await?)
}

pub async fn record_month(
    ctx: &AppContext,
    trust_id: &str,
    year: i32,
    month: u32,
    amount: Option<Decimal>,
) -> Result<Value, anyhow::Error> {
    to_json(&ctx.gov.record_monthly_payment(trust_id, year, month, amount).await?)
}

/// Loan terms from a JSON file, for mortgage loans
pub fn read_loan(path: &Path) -> Result<MortgageLoanData, anyhow::Error> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read loan file {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&raw)?)
}

pub async fn register_asset(ctx: &AppContext, request: RegisterAsset) -> Result<Value, anyhow::Error> {
    to_json(&ctx.gov.register_asset(request).await?)
}

pub async fn show_asset(ctx: &AppContext, asset_id: &str, viewer: Option<&str>) -> Result<Value, anyhow::Error> {
    to_json(&ctx.gov.get_asset_by_id(asset_id, viewer).await?)
}

#[allow(clippy::too_many_arguments)]
pub async fn list_assets(
    ctx: &AppContext,
    trust_id: &str,
    asset_type: Option<AssetType>,
    status: Option<ComplianceStatus>,
    beneficiary_id: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    viewer: Option<&str>,
) -> Result<Value, anyhow::Error> {
    let filter = AssetFilter {
        asset_type,
        status,
        beneficiary_id,
        limit,
        offset,
    };
    to_json(&ctx.gov.list_assets(trust_id, filter, viewer).await?)
}

pub async fn approve(
    ctx: &AppContext,
    asset_id: &str,
    actor_id: &str,
    reason: Option<String>,
) -> Result<Value, anyhow::Error> {
    to_json(&ctx.gov.approve_exception(asset_id, actor_id, reason).await?)
}

pub async fn reject(
    ctx: &AppContext,
    asset_id: &str,
    actor_id: &str,
    reason: Option<String>,
) -> Result<Value, anyhow::Error> {
    to_json(&ctx.gov.reject_exception(asset_id, actor_id, reason).await?)
}

pub async fn vote(
    ctx: &AppContext,
    asset_id: &str,
    voter_id: &str,
    choice: VoteChoice,
    reason: Option<String>,
) -> Result<Value, anyhow::Error> {
    to_json(&ctx.gov.vote_exception(asset_id, voter_id, choice, reason).await?)
}

pub async fn voting_status(ctx: &AppContext, asset_id: &str) -> Result<Value, anyhow::Error> {
    to_json(&ctx.gov.get_voting_status(asset_id).await?)
}

/// Generate an issuer key and store its seed in the data directory
pub fn keygen(config: &AppConfig, output: Option<&Path>) -> Result<Value, anyhow::Error> {
    let issuer = Ed25519Issuer::generate(config.dispatch.issuer_did.clone());
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.issuer_key_path());
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, issuer.seed_hex())?;

    Ok(json!({
        "key_file": path,
        "issuer": config.dispatch.issuer_did,
        "public_key": issuer.public_key_hex(),
    }))
}
