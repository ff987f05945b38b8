//! Core domain errors

use crate::status::ComplianceStatus;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised when a domain invariant would be broken
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Initial capital must be positive: {0}")]
    NonPositiveCapital(Decimal),

    #[error("Limit {name} must be within 0..=100, got {value}")]
    LimitOutOfRange { name: &'static str, value: Decimal },

    #[error("Bond and other-asset limits add up to {0}%, above 100%")]
    LimitsExceedCapital(Decimal),

    #[error("Asset value must be positive: {0}")]
    NonPositiveValue(Decimal),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ComplianceStatus,
        to: ComplianceStatus,
    },

    #[error("Unknown {field} value: {value}")]
    UnknownValue { field: &'static str, value: String },

    #[error("Invalid month {0}, expected 1..=12")]
    InvalidMonth(u32),
}

/// Result alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn unknown(field: &'static str, value: impl Into<String>) -> Self {
        CoreError::UnknownValue {
            field,
            value: value.into(),
        }
    }
}
