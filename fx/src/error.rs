//! FX engine error types.

use cambio_common::Currency;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::policy::RateInvariant;

/// Errors that can occur in the catalog or the conversion engine.
///
/// All of them are request-level failures. None is retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FxError {
    /// Directed pair is not in the configured allow-list.
    #[error("Currency pair {from}-{to} not supported")]
    UnsupportedPair { from: Currency, to: Currency },

    /// Amount is zero or negative.
    #[error("Amount must be greater than zero, got {0}")]
    InvalidAmount(Decimal),

    /// A caller-supplied override is out of range.
    #[error("Invalid override {field}: {value}")]
    InvalidOverride { field: &'static str, value: Decimal },

    /// Currency is absent from the catalog.
    #[error("Currency {0} not found")]
    CurrencyNotFound(Currency),

    /// Stored buy/sell rates are non-positive or violate the invariant.
    #[error("Invalid rate configuration for {currency}: buy {buy_rate}, sell {sell_rate} ({invariant})")]
    InvalidRateConfiguration {
        currency: Currency,
        buy_rate: Decimal,
        sell_rate: Decimal,
        invariant: RateInvariant,
    },

    /// Stored fee fraction outside `[0, 1)`.
    #[error("Invalid {fee} for {currency}: {value}")]
    InvalidFeeConfiguration {
        currency: Currency,
        fee: &'static str,
        value: Decimal,
    },

    /// Decimal overflow or division by zero in a pipeline step.
    #[error("Arithmetic overflow computing {0}")]
    ArithmeticOverflow(&'static str),

    /// Malformed currency code.
    #[error("Currency code must be 3-4 uppercase letters, got {0:?}")]
    InvalidCurrencyCode(String),

    /// Empty currency name.
    #[error("Currency name cannot be empty for {0}")]
    InvalidCurrencyName(Currency),

    /// Currency already present.
    #[error("Currency {0} already exists")]
    DuplicateCurrency(Currency),

    /// The base currency cannot be repriced or removed.
    #[error("Base currency {0} cannot be modified")]
    BaseCurrencyImmutable(Currency),

    /// A second base currency was requested.
    #[error("Base currency already set to {existing}")]
    BaseCurrencyExists { existing: Currency },

    /// The bridge currency must stay in the catalog.
    #[error("Bridge currency {0} cannot be removed")]
    BridgeCurrencyRequired(Currency),

    /// Quoted buy/sell spread exceeds the catalog maximum.
    #[error("Spread {spread_pct}% exceeds maximum {max_pct}% for {currency}")]
    SpreadTooWide {
        currency: Currency,
        spread_pct: Decimal,
        max_pct: Decimal,
    },
}

impl FxError {
    /// Stable error code for callers that map errors onto responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::UnsupportedPair { .. } => "UNSUPPORTED_PAIR",
            FxError::InvalidAmount(_) => "INVALID_AMOUNT",
            FxError::InvalidOverride { .. } => "INVALID_OVERRIDE",
            FxError::CurrencyNotFound(_) => "CURRENCY_NOT_FOUND",
            FxError::InvalidRateConfiguration { .. } => "INVALID_RATE_CONFIGURATION",
            FxError::InvalidFeeConfiguration { .. } => "INVALID_FEE_CONFIGURATION",
            FxError::ArithmeticOverflow(_) => "ARITHMETIC_OVERFLOW",
            FxError::InvalidCurrencyCode(_) => "INVALID_CURRENCY_CODE",
            FxError::InvalidCurrencyName(_) => "INVALID_CURRENCY_NAME",
            FxError::DuplicateCurrency(_) => "DUPLICATE_CURRENCY",
            FxError::BaseCurrencyImmutable(_) => "BASE_CURRENCY_IMMUTABLE",
            FxError::BaseCurrencyExists { .. } => "BASE_CURRENCY_EXISTS",
            FxError::BridgeCurrencyRequired(_) => "BRIDGE_CURRENCY_REQUIRED",
            FxError::SpreadTooWide { .. } => "SPREAD_TOO_WIDE",
        }
    }

    /// Whether the failure stems from stored catalog data rather than the
    /// caller's input.
    pub fn is_catalog_fault(&self) -> bool {
        matches!(
            self,
            FxError::InvalidRateConfiguration { .. } | FxError::InvalidFeeConfiguration { .. }
        )
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
