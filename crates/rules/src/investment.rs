//! Concentration limits on the trust portfolio
//!
//! A limit is exceeded when the class total, including the new asset,
//! is strictly greater than `initial_capital × limit / 100`.

use crate::config::RulesConfig;
use fidei_core::{Amount, AssetClass, AssetType, RuleDetails, RuleId, RuleOutcome, TrustLimits};
use rust_decimal::Decimal;
use serde_json::json;

/// An existing or prospective position: type and MXN value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Holding {
    pub asset_type: AssetType,
    pub value: Decimal,
}

impl Holding {
    pub fn new(asset_type: AssetType, value: Decimal) -> Self {
        Self { asset_type, value }
    }
}

/// Input for the concentration rules
#[derive(Debug, Clone, Copy)]
pub struct InvestmentContext<'a> {
    pub initial_capital: Amount,
    pub limits: TrustLimits,
    pub existing: &'a [Holding],
    pub new_asset: Holding,
}

impl InvestmentContext<'_> {
    /// Class total after adding the new asset (if it belongs to the class)
    pub fn class_total(&self, class: AssetClass) -> Decimal {
        let current: Decimal = self
            .existing
            .iter()
            .filter(|h| h.asset_type.class() == class)
            .map(|h| h.value)
            .sum();

        if self.new_asset.asset_type.class() == class {
            current + self.new_asset.value
        } else {
            current
        }
    }
}

fn check_concentration(
    ctx: &InvestmentContext<'_>,
    class: AssetClass,
    config: &RulesConfig,
) -> RuleOutcome {
    let (rule, label, fallback) = match class {
        AssetClass::Bond => (
            RuleId::BondLimit,
            "Government bond investment",
            config.default_bond_limit_percent,
        ),
        AssetClass::Other => (
            RuleId::OtherAssetsLimit,
            "Other assets investment",
            config.default_other_limit_percent,
        ),
    };

    let limit_percent = ctx.limits.for_class(class).unwrap_or(fallback);
    let limit_amount = ctx.initial_capital.percent(limit_percent);
    let total_invested = ctx.class_total(class);
    let current_percent = ctx.initial_capital.share_of(total_invested).round_dp(2);
    let exceeds = total_invested > limit_amount;

    let message = if exceeds {
        format!(
            "{} limit exceeded: {:.2}% (limit: {}%)",
            label, current_percent, limit_percent
        )
    } else {
        format!(
            "{} within limit: {:.2}% (limit: {}%)",
            label, current_percent, limit_percent
        )
    };

    RuleOutcome::new(
        rule,
        !exceeds,
        message,
        RuleDetails::Concentration {
            current_percent,
            limit_percent,
            total_invested,
            limit_amount,
        },
    )
    .with_extra(json!({ "counted_types": class.asset_types() }))
}

/// Bond concentration rule
pub fn check_bond_limit(ctx: &InvestmentContext<'_>, config: &RulesConfig) -> RuleOutcome {
    check_concentration(ctx, AssetClass::Bond, config)
}

/// Concentration rule for every non-bond asset type
pub fn check_other_assets_limit(ctx: &InvestmentContext<'_>, config: &RulesConfig) -> RuleOutcome {
    check_concentration(ctx, AssetClass::Other, config)
}

/// Runs the concentration rule matching the new asset's class
pub fn evaluate_investment(ctx: &InvestmentContext<'_>, config: &RulesConfig) -> Vec<RuleOutcome> {
    match ctx.new_asset.asset_type.class() {
        AssetClass::Bond => vec![check_bond_limit(ctx, config)],
        AssetClass::Other => vec![check_other_assets_limit(ctx, config)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn capital() -> Amount {
        Amount::new(dec!(1000000)).unwrap()
    }

    fn limits() -> TrustLimits {
        TrustLimits::new(Some(dec!(30)), Some(dec!(70))).unwrap()
    }

    #[test]
    fn test_bond_within_limit() {
        let existing = [Holding::new(AssetType::GovernmentBond, dec!(100000))];
        let ctx = InvestmentContext {
            initial_capital: capital(),
            limits: limits(),
            existing: &existing,
            new_asset: Holding::new(AssetType::GovernmentBond, dec!(150000)),
        };

        let outcome = check_bond_limit(&ctx, &RulesConfig::default());
        assert!(outcome.compliant);
        assert_eq!(outcome.message, "Government bond investment within limit: 25.00% (limit: 30%)");
        assert_eq!(outcome.extra, Some(serde_json::json!({ "counted_types": ["GovernmentBond"] })));
        match outcome.details {
            RuleDetails::Concentration {
                current_percent,
                total_invested,
                limit_amount,
                ..
            } => {
                assert_eq!(current_percent, dec!(25));
                assert_eq!(total_invested, dec!(250000));
                assert_eq!(limit_amount, dec!(300000));
            }
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn test_exactly_at_limit_is_compliant() {
        let ctx = InvestmentContext {
            initial_capital: capital(),
            limits: limits(),
            existing: &[],
            new_asset: Holding::new(AssetType::GovernmentBond, dec!(300000)),
        };
        assert!(check_bond_limit(&ctx, &RulesConfig::default()).compliant);
    }

    #[test]
    fn test_one_peso_over_limit_fails() {
        let ctx = InvestmentContext {
            initial_capital: capital(),
            limits: limits(),
            existing: &[],
            new_asset: Holding::new(AssetType::GovernmentBond, dec!(300001)),
        };
        let outcome = check_bond_limit(&ctx, &RulesConfig::default());
        assert!(!outcome.compliant);
        assert!(outcome.message.starts_with("Government bond investment limit exceeded"));
    }

    #[test]
    fn test_other_types_pool_together() {
        let existing = [
            Holding::new(AssetType::MortgageLoan, dec!(300000)),
            Holding::new(AssetType::InsuranceReserve, dec!(200000)),
            Holding::new(AssetType::GovernmentBond, dec!(300000)),
        ];
        let ctx = InvestmentContext {
            initial_capital: capital(),
            limits: limits(),
            existing: &existing,
            new_asset: Holding::new(AssetType::SocialHousing, dec!(250000)),
        };

        assert_eq!(ctx.class_total(AssetClass::Other), dec!(750000));
        let outcomes = evaluate_investment(&ctx, &RulesConfig::default());
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].rule, RuleId::OtherAssetsLimit);
        assert!(!outcomes[0].compliant);
    }

    #[test]
    fn test_only_matching_class_rule_runs() {
        let ctx = InvestmentContext {
            initial_capital: capital(),
            limits: limits(),
            existing: &[],
            new_asset: Holding::new(AssetType::GovernmentBond, dec!(1)),
        };
        let outcomes = evaluate_investment(&ctx, &RulesConfig::default());
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].rule, RuleId::BondLimit);
    }

    #[test]
    fn test_missing_limit_uses_configured_default() {
        let ctx = InvestmentContext {
            initial_capital: capital(),
            limits: TrustLimits::default(),
            existing: &[],
            new_asset: Holding::new(AssetType::CnbvApproved, dec!(700001)),
        };
        let outcome = check_other_assets_limit(&ctx, &RulesConfig::default());
        assert!(!outcome.compliant);
        assert!(outcome.message.ends_with("(limit: 70%)"));
    }
}
