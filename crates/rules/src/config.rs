//! Rule configuration
//!
//! Contract constants are configurable via file, not hardcoded.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration for the rule evaluators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    // === Mortgage loans ===
    /// Property price cap, as a multiple of the annual area minimum wage
    #[serde(default = "default_price_wage_multiplier")]
    pub price_wage_multiplier: Decimal,

    #[serde(default = "default_min_term_years")]
    pub min_term_years: u32,

    #[serde(default = "default_max_term_years")]
    pub max_term_years: u32,

    // === Fees ===
    /// Full prior years checked for monthly installments
    #[serde(default = "default_fee_lookback_years")]
    pub fee_lookback_years: u32,

    // === Concentration ===
    /// Applied when a trust has no bond limit of its own
    #[serde(default = "default_bond_limit_percent")]
    pub default_bond_limit_percent: Decimal,

    /// Applied when a trust has no other-assets limit of its own
    #[serde(default = "default_other_limit_percent")]
    pub default_other_limit_percent: Decimal,
}

fn default_price_wage_multiplier() -> Decimal {
    Decimal::new(10, 0)
}

fn default_min_term_years() -> u32 {
    10
}

fn default_max_term_years() -> u32 {
    20
}

fn default_fee_lookback_years() -> u32 {
    1
}

fn default_bond_limit_percent() -> Decimal {
    Decimal::new(30, 0)
}

fn default_other_limit_percent() -> Decimal {
    Decimal::new(70, 0)
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            price_wage_multiplier: default_price_wage_multiplier(),
            min_term_years: default_min_term_years(),
            max_term_years: default_max_term_years(),
            fee_lookback_years: default_fee_lookback_years(),
            default_bond_limit_percent: default_bond_limit_percent(),
            default_other_limit_percent: default_other_limit_percent(),
        }
    }
}

impl RulesConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
