//! Database schema definitions
//!
//! Row types for sqlx mapping from SQLite tables.
//! Schema is defined in migrations/20260301000000_init.sql

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use fidei_core::{
    Actor, Amount, Asset, AssetType, ComplianceStatus, CredentialAnchor, ExceptionVote,
    Membership, MonthlyPayment, Role, Trust, TrustLimits, ValidationRecord, VoteChoice,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub(crate) fn parse_decimal(value: &str) -> StoreResult<Decimal> {
    Decimal::from_str(value).map_err(|_| StoreError::InvalidDecimal(value.to_string()))
}

fn parse_enum<T: FromStr>(field: &str, value: &str) -> StoreResult<T> {
    T::from_str(value).map_err(|_| StoreError::invalid_enum(field, value))
}

/// Row type for table `trusts`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TrustRow {
    pub id: String,
    pub name: String,
    pub initial_capital: String,             // Decimal stored as TEXT
    pub bond_limit_percent: Option<String>,  // Decimal stored as TEXT
    pub other_limit_percent: Option<String>, // Decimal stored as TEXT
    pub requires_consensus: bool,
    pub created_at: DateTime<Utc>,
}

/// Row type for table `actors`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ActorRow {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub is_super_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Row type for table `memberships`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct MembershipRow {
    pub actor_id: String,
    pub trust_id: String,
    pub role_in_trust: String,
    pub active: bool,
    pub assigned_at: DateTime<Utc>,
}

/// Row type for table `fee_records`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct FeeRecordRow {
    pub trust_id: String,
    pub study_fee_amount: String,
    pub study_fee_paid: bool,
    pub annual_fee: String,
}

/// Row type for table `monthly_payments`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct MonthlyPaymentRow {
    pub trust_id: String,
    pub year: i64,
    pub month: i64,
    pub amount: String,
    pub paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Row type for table `assets`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AssetRow {
    pub id: String,
    pub trust_id: String,
    pub asset_type: String,
    pub value_mxn: String, // Decimal stored as TEXT
    pub description: Option<String>,
    pub document_hash: Option<String>,
    pub beneficiary_id: Option<String>,
    pub compliance_status: String,
    pub compliant: bool,
    pub validation: String, // JSON
    pub registered_by: String,
    pub registered_at: DateTime<Utc>,
    pub credential_id: Option<String>,
    pub credential_hash: Option<String>,
    pub anchor_reference: Option<String>,
    pub anchor_network: Option<String>,
    pub anchored_at: Option<DateTime<Utc>>,
}

/// Type and value of an asset, enough for concentration sums
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HoldingRow {
    pub asset_type: String,
    pub value_mxn: String,
}

/// Row type for table `exception_votes`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct VoteRow {
    pub id: String,
    pub asset_id: String,
    pub trust_id: String,
    pub voter_id: String,
    pub choice: String,
    pub reason: String,
    pub voted_at: DateTime<Utc>,
}

/// Row type for table `alerts`
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct AlertRow {
    pub id: String,
    pub recipient_id: String,
    pub trust_id: Option<String>,
    pub asset_id: Option<String>,
    pub alert_type: String,
    pub subtype: String,
    pub severity: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Row type for table `audit_log`
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct AuditRow {
    pub id: String,
    pub actor_id: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub trust_id: Option<String>,
    pub details: String, // JSON
    pub created_at: DateTime<Utc>,
}

// === Conversion implementations ===

impl From<&Trust> for TrustRow {
    fn from(trust: &Trust) -> Self {
        Self {
            id: trust.id.clone(),
            name: trust.name.clone(),
            initial_capital: trust.initial_capital.to_string(),
            bond_limit_percent: trust.limits.bond_limit_percent.map(|d| d.to_string()),
            other_limit_percent: trust.limits.other_limit_percent.map(|d| d.to_string()),
            requires_consensus: trust.requires_consensus,
            created_at: trust.created_at,
        }
    }
}

impl TryFrom<TrustRow> for Trust {
    type Error = StoreError;

    fn try_from(row: TrustRow) -> StoreResult<Self> {
        let capital = parse_decimal(&row.initial_capital)?;
        let initial_capital = Amount::new(capital)
            .map_err(|e| StoreError::Corrupt(format!("trust {}: {}", row.id, e)))?;
        let limits = TrustLimits {
            bond_limit_percent: row.bond_limit_percent.as_deref().map(parse_decimal).transpose()?,
            other_limit_percent: row.other_limit_percent.as_deref().map(parse_decimal).transpose()?,
        };

        Ok(Trust {
            id: row.id,
            name: row.name,
            initial_capital,
            limits,
            requires_consensus: row.requires_consensus,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<ActorRow> for Actor {
    type Error = StoreError;

    fn try_from(row: ActorRow) -> StoreResult<Self> {
        Ok(Actor {
            role: parse_enum::<Role>("role", &row.role)?,
            id: row.id,
            name: row.name,
            email: row.email,
            is_super_admin: row.is_super_admin,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<MembershipRow> for Membership {
    type Error = StoreError;

    fn try_from(row: MembershipRow) -> StoreResult<Self> {
        Ok(Membership {
            role_in_trust: parse_enum::<Role>("role_in_trust", &row.role_in_trust)?,
            actor_id: row.actor_id,
            trust_id: row.trust_id,
            active: row.active,
            assigned_at: row.assigned_at,
        })
    }
}

impl TryFrom<MonthlyPaymentRow> for MonthlyPayment {
    type Error = StoreError;

    fn try_from(row: MonthlyPaymentRow) -> StoreResult<Self> {
        Ok(MonthlyPayment {
            year: row.year as i32,
            month: row.month as u32,
            amount: parse_decimal(&row.amount)?,
            paid: row.paid,
            paid_at: row.paid_at,
        })
    }
}

impl AssetRow {
    pub fn from_asset(asset: &Asset) -> StoreResult<Self> {
        let credential = asset.credential.as_ref();
        Ok(Self {
            id: asset.id.clone(),
            trust_id: asset.trust_id.clone(),
            asset_type: asset.asset_type.to_string(),
            value_mxn: asset.value_mxn.to_string(),
            description: asset.description.clone(),
            document_hash: asset.document_hash.clone(),
            beneficiary_id: asset.beneficiary_id.clone(),
            compliance_status: asset.compliance_status.as_str().to_string(),
            compliant: asset.compliant,
            validation: serde_json::to_string(&asset.validation)?,
            registered_by: asset.registered_by.clone(),
            registered_at: asset.registered_at,
            credential_id: credential.map(|c| c.credential_id.clone()),
            credential_hash: credential.map(|c| c.credential_hash.clone()),
            anchor_reference: credential.and_then(|c| c.anchor_reference.clone()),
            anchor_network: credential.and_then(|c| c.network.clone()),
            anchored_at: credential.and_then(|c| c.anchored_at),
        })
    }
}

impl TryFrom<AssetRow> for Asset {
    type Error = StoreError;

    fn try_from(row: AssetRow) -> StoreResult<Self> {
        let value = parse_decimal(&row.value_mxn)?;
        let value_mxn = Amount::new(value)
            .map_err(|e| StoreError::Corrupt(format!("asset {}: {}", row.id, e)))?;
        let validation: ValidationRecord = serde_json::from_str(&row.validation)?;

        let credential = match (row.credential_id, row.credential_hash) {
            (Some(credential_id), Some(credential_hash)) => Some(CredentialAnchor {
                credential_id,
                credential_hash,
                anchor_reference: row.anchor_reference,
                network: row.anchor_network,
                anchored_at: row.anchored_at,
            }),
            _ => None,
        };

        Ok(Asset {
            asset_type: parse_enum::<AssetType>("asset_type", &row.asset_type)?,
            compliance_status: parse_enum::<ComplianceStatus>(
                "compliance_status",
                &row.compliance_status,
            )?,
            id: row.id,
            trust_id: row.trust_id,
            value_mxn,
            description: row.description,
            document_hash: row.document_hash,
            beneficiary_id: row.beneficiary_id,
            compliant: row.compliant,
            validation,
            registered_by: row.registered_by,
            registered_at: row.registered_at,
            credential,
        })
    }
}

impl HoldingRow {
    pub fn parse(&self) -> StoreResult<(AssetType, Decimal)> {
        Ok((
            parse_enum::<AssetType>("asset_type", &self.asset_type)?,
            parse_decimal(&self.value_mxn)?,
        ))
    }
}

impl TryFrom<VoteRow> for ExceptionVote {
    type Error = StoreError;

    fn try_from(row: VoteRow) -> StoreResult<Self> {
        Ok(ExceptionVote {
            choice: parse_enum::<VoteChoice>("choice", &row.choice)?,
            id: row.id,
            asset_id: row.asset_id,
            trust_id: row.trust_id,
            voter_id: row.voter_id,
            reason: row.reason,
            voted_at: row.voted_at,
        })
    }
}
