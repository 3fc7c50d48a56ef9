//! Main conversion engine implementation.

use std::sync::Arc;

use cambio_common::{Currency, CurrencyPair};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use crate::catalog::RateCatalog;
use crate::conversion::{ConversionRequest, ConversionResult};
use crate::error::{FxError, FxResult};
use crate::pairs::SupportedPairs;
use crate::pipeline::{PipelineSteps, ResolvedRates};
use crate::policy::{check_record, RateInvariant};

/// Configuration for the conversion engine.
#[derive(Debug, Clone)]
pub struct ConversionEngineConfig {
    /// Directed pairs the engine accepts, with their route direction.
    pub pairs: SupportedPairs,
    /// Buy/sell ordering every stored record must satisfy.
    pub rate_invariant: RateInvariant,
}

impl Default for ConversionEngineConfig {
    fn default() -> Self {
        Self {
            pairs: SupportedPairs::brl_bob(),
            rate_invariant: RateInvariant::default(),
        }
    }
}

/// Validates requests and runs the fee/spread pipeline against a catalog.
///
/// The engine holds no mutable state: concurrent calls are independent and
/// identical inputs over an unchanged catalog give identical results.
pub struct ConversionEngine {
    catalog: Arc<dyn RateCatalog>,
    config: ConversionEngineConfig,
}

impl ConversionEngine {
    /// Create a new engine over the given catalog.
    pub fn new(catalog: Arc<dyn RateCatalog>, config: ConversionEngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Convert an amount along a supported pair.
    ///
    /// Checks run in order and the first failure wins: pair, amount,
    /// overrides, catalog lookups, stored record validity.
    #[instrument(skip(self, request), fields(
        from_currency = %request.from_currency,
        to_currency = %request.to_currency,
        amount = %request.amount
    ))]
    pub async fn convert(&self, request: ConversionRequest) -> FxResult<ConversionResult> {
        let pair = request.pair();

        let direction = self
            .config
            .pairs
            .direction(&pair)
            .ok_or_else(|| FxError::UnsupportedPair {
                from: pair.from.clone(),
                to: pair.to.clone(),
            })?;

        if request.amount <= Decimal::ZERO {
            return Err(FxError::InvalidAmount(request.amount));
        }

        request.overrides.validate()?;

        debug!(catalog = self.catalog.name(), "Looking up rates");
        let (from, to, bridge) = tokio::try_join!(
            self.catalog.get_rate(&pair.from),
            self.catalog.get_rate(&pair.to),
            self.catalog.get_bridge_rate(),
        )?;

        for record in [&from, &to, &bridge] {
            check_record(self.config.rate_invariant, record)?;
        }

        let rates = ResolvedRates::resolve(&request.overrides, &from, &to, &bridge);
        debug!(
            bridge = %bridge.code,
            %direction,
            exchange_rate = %rates.exchange_rate,
            target_exchange_rate = %rates.target_exchange_rate,
            is_custom = rates.is_custom,
            "Resolved conversion parameters"
        );

        let steps = PipelineSteps::run(request.amount, &rates, direction)?;
        debug_assert!(steps.final_amount >= Decimal::ZERO);

        let result =
            ConversionResult::from_pipeline(pair, bridge.code, direction, request.amount, &rates, &steps);

        info!(
            final_amount = %result.final_amount,
            effective_rate = ?result.effective_rate(),
            is_custom = result.steps.is_custom,
            "Conversion completed"
        );

        Ok(result)
    }

    /// Convert with stored parameters and return only the delivered amount.
    pub async fn convert_simple(&self, from: Currency, to: Currency, amount: Decimal) -> FxResult<Decimal> {
        let result = self.convert(ConversionRequest::new(from, to, amount)).await?;
        Ok(result.final_amount)
    }

    /// Get all supported directed pairs, ordered.
    pub fn supported_pairs(&self) -> Vec<CurrencyPair> {
        self.config.pairs.pairs()
    }

    /// Check if a directed pair is supported.
    pub fn supports_pair(&self, pair: &CurrencyPair) -> bool {
        self.config.pairs.contains(pair)
    }

    /// The catalog this engine reads from.
    pub fn catalog(&self) -> &Arc<dyn RateCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &ConversionEngineConfig {
        &self.config
    }
}
