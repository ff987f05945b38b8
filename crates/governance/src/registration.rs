//! Asset registration and asset queries

use crate::access::{authorize, check_beneficiary, split_roles, REGISTRAR_ROLES};
use crate::context::Governance;
use crate::error::{GovernanceError, GovernanceResult};
use chrono::Utc;
use fidei_core::{
    Asset, AssetType, ComplianceStatus, MortgageLoanData, Role, ValidationRecord,
};
use fidei_dispatch::{Audience, DomainEvent};
use fidei_rules::{AssetCandidate, Holding};
use fidei_store::{ActorRepo, AssetQuery, AssetRepo, FeeRepo, MembershipRepo, TrustRepo};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Input of [`Governance::register_asset`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterAsset {
    pub trust_id: String,
    pub asset_type: AssetType,
    pub value_mxn: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub document_hash: Option<String>,
    #[serde(default)]
    pub beneficiary_id: Option<String>,
    #[serde(default)]
    pub loan: Option<MortgageLoanData>,
    pub registered_by: String,
}

/// Outcome of a registration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub asset: Asset,
    pub compliant: bool,
    pub status: ComplianceStatus,
    pub validation: ValidationRecord,
}

/// Filters for [`Governance::list_assets`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFilter {
    pub asset_type: Option<AssetType>,
    pub status: Option<ComplianceStatus>,
    pub beneficiary_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetPage {
    pub assets: Vec<Asset>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl Governance {
    /// Register an asset against a trust.
    ///
    /// Gates run in order: trust, registrar, fee prerequisite, beneficiary.
    /// Reading the current holdings, evaluating and inserting happen in one
    /// transaction while the trust's lock is held. The lock is released on
    /// commit, before side effects run.
    pub async fn register_asset(&self, request: RegisterAsset) -> GovernanceResult<Registration> {
        let pool = self.db.pool();
        let guard = self.locks.lock(&format!("trust:{}", request.trust_id)).await;

        let trust = TrustRepo::get_by_id(pool, &request.trust_id).await?;
        authorize(pool, &request.registered_by, &trust.id, REGISTRAR_ROLES).await?;

        let fees = FeeRepo::get(pool, &trust.id).await?.ok_or_else(|| {
            GovernanceError::Precondition(format!("no fee record for trust {}", trust.id))
        })?;
        let fee_outcome = self.engine.check_fees(&fees, self.clock.today());
        if !fee_outcome.compliant {
            warn!(trust_id = %trust.id, reason = %fee_outcome.message, "Registration blocked by unpaid fees");
            return Err(GovernanceError::Precondition(fee_outcome.message));
        }

        let value = Asset::checked_value(request.value_mxn)?;
        if let Some(ref beneficiary_id) = request.beneficiary_id {
            check_beneficiary(pool, beneficiary_id, &trust.id).await?;
        }

        let mut tx = self.db.begin().await?;

        let existing: Vec<Holding> = AssetRepo::holdings_excluding_pending(&mut *tx, &trust.id)
            .await?
            .into_iter()
            .map(|(asset_type, value)| Holding::new(asset_type, value))
            .collect();

        let evaluation = self.engine.evaluate(
            &trust,
            &existing,
            &AssetCandidate {
                asset_type: request.asset_type,
                value,
                loan: request.loan.as_ref(),
            },
        );
        let status = evaluation.status;

        let asset = Asset {
            id: uuid_v4(),
            trust_id: trust.id.clone(),
            asset_type: request.asset_type,
            value_mxn: value,
            description: request.description,
            document_hash: request.document_hash,
            beneficiary_id: request.beneficiary_id,
            compliance_status: status,
            compliant: status.is_compliant(),
            validation: evaluation.into_record(fee_outcome),
            registered_by: request.registered_by,
            registered_at: Utc::now(),
            credential: None,
        };
        AssetRepo::insert(&mut *tx, &asset).await?;

        let memberships = MembershipRepo::list_active(&mut *tx, &trust.id).await?;
        tx.commit().await?;
        drop(guard);

        info!(
            asset_id = %asset.id,
            trust_id = %trust.id,
            asset_type = %asset.asset_type,
            status = %status,
            "Asset registered"
        );

        let (trustees, committee) = split_roles(&memberships);
        self.publish(&[DomainEvent::AssetRegistered {
            trust,
            asset: asset.clone(),
            audience: Audience { trustees, committee },
        }])
        .await;

        Ok(Registration {
            compliant: asset.compliant,
            status,
            validation: asset.validation.clone(),
            asset,
        })
    }

    /// Fetch an asset. A beneficiary viewer only sees assets linked to them.
    pub async fn get_asset_by_id(&self, asset_id: &str, viewer_id: Option<&str>) -> GovernanceResult<Asset> {
        let pool = self.db.pool();
        let asset = AssetRepo::get_by_id(pool, asset_id).await?;

        if let Some(viewer_id) = viewer_id {
            let viewer = ActorRepo::get_by_id(pool, viewer_id).await?;
            if viewer.role.satisfies(Role::Beneficiary)
                && asset.beneficiary_id.as_deref() != Some(viewer_id)
            {
                return Err(GovernanceError::Authorization(format!(
                    "asset {} is not linked to beneficiary {}",
                    asset_id, viewer_id
                )));
            }
        }
        Ok(asset)
    }

    /// Page of a trust's assets, newest first
    pub async fn list_assets(
        &self,
        trust_id: &str,
        filter: AssetFilter,
        viewer_id: Option<&str>,
    ) -> GovernanceResult<AssetPage> {
        let pool = self.db.pool();
        TrustRepo::get_by_id(pool, trust_id).await?;

        let mut query = AssetQuery::for_trust(trust_id);
        query.asset_type = filter.asset_type;
        query.status = filter.status;
        query.beneficiary_id = filter.beneficiary_id;
        query.limit = filter.limit.filter(|l| *l > 0).unwrap_or(AssetQuery::DEFAULT_LIMIT);
        query.offset = filter.offset.filter(|o| *o >= 0).unwrap_or(0);

        if let Some(viewer_id) = viewer_id {
            let viewer = ActorRepo::get_by_id(pool, viewer_id).await?;
            if viewer.role.satisfies(Role::Beneficiary) {
                query.beneficiary_id = Some(viewer_id.to_string());
            }
        }

        let assets = AssetRepo::list(pool, &query).await?;
        let total = AssetRepo::count(pool, &query).await?;

        Ok(AssetPage {
            assets,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }
}

fn uuid_v4() -> String {
    uuid::Uuid::new_v4().to_string()
}
