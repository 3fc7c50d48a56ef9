//! Cambio FX Engine
//!
//! Multi-hop currency conversion through a bridge currency, applying bank
//! fees, platform fees and spreads on top of stored buy/sell rates.
//!
//! # Features
//!
//! - Pluggable rate catalog with an in-memory implementation
//! - Injected allow-list of directed pairs with per-pair route direction
//! - Configurable buy/sell invariant checked before any arithmetic
//! - Per-field rate overrides with an itemized audit trail
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cambio_fx::{ConversionEngine, ConversionEngineConfig, ConversionRequest, InMemoryRateCatalog};
//! use cambio_common::Currency;
//!
//! let catalog = Arc::new(InMemoryRateCatalog::from_snapshot(snapshot, Default::default())?);
//! let engine = ConversionEngine::new(catalog, ConversionEngineConfig::default());
//!
//! let request = ConversionRequest::new(Currency::brl(), Currency::bob(), dec!(1000));
//! let result = engine.convert(request).await?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```

pub mod catalog;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod pairs;
pub mod pipeline;
pub mod policy;

pub use catalog::{
    CatalogConfig, CatalogSnapshot, InMemoryRateCatalog, NewCurrency, RateCatalog, RateQuote,
    RateUpdate,
};
pub use conversion::{
    ConversionRequest, ConversionResult, ConversionSteps, ExchangeRatesUsed, RateOverrides,
};
pub use engine::{ConversionEngine, ConversionEngineConfig};
pub use error::{FxError, FxResult};
pub use pairs::{RouteDirection, SupportedPairs};
pub use policy::RateInvariant;
