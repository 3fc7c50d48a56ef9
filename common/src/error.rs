//! Error types for parsing Cambio value types.

use thiserror::Error;

/// Errors raised when parsing shared value types from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Currency code is not 3-4 uppercase ASCII letters.
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrencyCode(String),

    /// Currency pair is not in `FROM/TO` form.
    #[error("Invalid currency pair: {0:?}")]
    InvalidCurrencyPair(String),

    /// Unknown rate type.
    #[error("Invalid rate type {0:?}, expected base, fiat or crypto")]
    InvalidRateType(String),
}
