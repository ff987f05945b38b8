//! Trust assets and the loan data attached to mortgage loans

use crate::amount::Amount;
use crate::error::{CoreError, CoreResult};
use crate::status::ComplianceStatus;
use crate::validation::{ExceptionResolution, ResolutionDecision, ValidationRecord};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Kind of investment held by a trust
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum AssetType {
    GovernmentBond,
    MortgageLoan,
    InsuranceReserve,
    #[serde(rename = "CNBVApproved")]
    #[strum(serialize = "CNBVApproved")]
    CnbvApproved,
    SocialHousing,
}

/// Concentration bucket an asset type counts against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Bond,
    Other,
}

impl AssetClass {
    /// Asset types counted against this bucket
    pub fn asset_types(&self) -> Vec<AssetType> {
        AssetType::iter().filter(|t| t.class() == *self).collect()
    }
}

impl AssetType {
    pub fn class(&self) -> AssetClass {
        match self {
            AssetType::GovernmentBond => AssetClass::Bond,
            _ => AssetClass::Other,
        }
    }

    pub fn is_mortgage_loan(&self) -> bool {
        matches!(self, AssetType::MortgageLoan)
    }
}

/// Terms of a mortgage loan granted from trust funds.
///
/// Amounts are MXN; `interest_rate` and `max_bond_yield_rate` are percentages.
/// `area_minimum_wage` is the annualised general minimum wage of the
/// property's geographic area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MortgageLoanData {
    pub price: Decimal,
    pub loan_amount: Decimal,
    pub term_years: u32,
    pub monthly_payment: Decimal,
    pub has_mortgage_guarantee: bool,
    pub has_life_insurance: bool,
    pub has_fire_insurance: bool,
    pub interest_rate: Decimal,
    pub area_minimum_wage: Decimal,
    #[serde(default)]
    pub max_bond_yield_rate: Option<Decimal>,
}

/// Credential fields written by the anchoring side effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialAnchor {
    pub credential_id: String,
    pub credential_hash: String,
    pub anchor_reference: Option<String>,
    pub network: Option<String>,
    pub anchored_at: Option<DateTime<Utc>>,
}

/// An investment registered against a trust
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub trust_id: String,
    pub asset_type: AssetType,
    pub value_mxn: Amount,
    pub description: Option<String>,
    pub document_hash: Option<String>,
    pub beneficiary_id: Option<String>,
    pub compliance_status: ComplianceStatus,
    /// Always equal to `compliance_status.is_compliant()`
    pub compliant: bool,
    pub validation: ValidationRecord,
    pub registered_by: String,
    pub registered_at: DateTime<Utc>,
    pub credential: Option<CredentialAnchor>,
}

impl Asset {
    pub fn class(&self) -> AssetClass {
        self.asset_type.class()
    }

    /// Apply an exception resolution, leaving PENDING_REVIEW for good.
    pub fn resolve(&mut self, resolution: ExceptionResolution) -> CoreResult<()> {
        let next = match resolution.decision {
            ResolutionDecision::Approved => ComplianceStatus::ExceptionApproved,
            ResolutionDecision::Rejected => ComplianceStatus::NonCompliant,
        };
        self.compliance_status = self.compliance_status.transition_to(next)?;
        self.compliant = next.is_compliant();
        self.validation.resolution = Some(resolution);
        Ok(())
    }

    /// Rejects values that are not strictly positive
    pub fn checked_value(value: Decimal) -> CoreResult<Amount> {
        Amount::new(value).map_err(|_| CoreError::NonPositiveValue(value))
    }
}
