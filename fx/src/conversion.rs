//! Conversion request and result types.

use cambio_common::{Currency, CurrencyPair};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};
use crate::pairs::RouteDirection;
use crate::pipeline::{PipelineSteps, ResolvedRates};
use crate::policy::is_valid_fraction;

/// Decimal places for monetary amounts at the output boundary.
pub const MONEY_DP: u32 = 2;
/// Decimal places for rates and fee fractions at the output boundary.
pub const RATE_DP: u32 = 4;

/// Caller-supplied replacements for stored parameters. Each field, when
/// set, takes precedence over the corresponding catalog value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateOverrides {
    /// Replaces the source currency's bank fee.
    pub bank_fee_rate: Option<Decimal>,
    /// Replaces the bridge currency's platform fee.
    pub platform_fee_rate: Option<Decimal>,
    /// Replaces the target currency's spread.
    pub spread_rate: Option<Decimal>,
    /// Replaces the source currency's buy rate.
    pub exchange_rate: Option<Decimal>,
    /// Replaces the target currency's sell rate.
    pub target_exchange_rate: Option<Decimal>,
}

impl RateOverrides {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.bank_fee_rate.is_none()
            && self.platform_fee_rate.is_none()
            && self.spread_rate.is_none()
            && self.exchange_rate.is_none()
            && self.target_exchange_rate.is_none()
    }

    pub fn bank_fee_rate(mut self, rate: Decimal) -> Self {
        self.bank_fee_rate = Some(rate);
        self
    }

    pub fn platform_fee_rate(mut self, rate: Decimal) -> Self {
        self.platform_fee_rate = Some(rate);
        self
    }

    pub fn spread_rate(mut self, rate: Decimal) -> Self {
        self.spread_rate = Some(rate);
        self
    }

    pub fn exchange_rate(mut self, rate: Decimal) -> Self {
        self.exchange_rate = Some(rate);
        self
    }

    pub fn target_exchange_rate(mut self, rate: Decimal) -> Self {
        self.target_exchange_rate = Some(rate);
        self
    }

    /// Fees must be in `[0, 1)`, exchange rates strictly positive.
    pub fn validate(&self) -> FxResult<()> {
        let fees = [
            ("bankFeeRate", self.bank_fee_rate),
            ("platformFeeRate", self.platform_fee_rate),
            ("spreadRate", self.spread_rate),
        ];
        for (field, value) in fees {
            if let Some(value) = value {
                if !is_valid_fraction(value) {
                    return Err(FxError::InvalidOverride { field, value });
                }
            }
        }

        let rates = [
            ("exchangeRate", self.exchange_rate),
            ("targetExchangeRate", self.target_exchange_rate),
        ];
        for (field, value) in rates {
            if let Some(value) = value {
                if value <= Decimal::ZERO {
                    return Err(FxError::InvalidOverride { field, value });
                }
            }
        }

        Ok(())
    }
}

/// Request to perform a conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    pub from_currency: Currency,
    pub to_currency: Currency,
    /// Amount in the source currency.
    pub amount: Decimal,
    #[serde(default)]
    pub overrides: RateOverrides,
}

impl ConversionRequest {
    /// Create a new conversion request using stored parameters only.
    pub fn new(from: Currency, to: Currency, amount: Decimal) -> Self {
        Self {
            from_currency: from,
            to_currency: to,
            amount,
            overrides: RateOverrides::default(),
        }
    }

    /// Use custom parameters.
    pub fn with_overrides(mut self, overrides: RateOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Get the directed currency pair.
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(
            Currency::new(self.from_currency.code()),
            Currency::new(self.to_currency.code()),
        )
    }
}

/// Rates and fee fractions that fed the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRatesUsed {
    /// Source hop rate.
    #[serde(serialize_with = "fixed::rate")]
    pub from: Decimal,
    /// Target hop rate.
    #[serde(serialize_with = "fixed::rate")]
    pub to: Decimal,
    #[serde(serialize_with = "fixed::rate")]
    pub platform_fee_rate: Decimal,
    #[serde(serialize_with = "fixed::rate")]
    pub bank_fee_rate: Decimal,
    #[serde(serialize_with = "fixed::rate")]
    pub spread_rate: Decimal,
}

/// Itemized audit trail of one conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionSteps {
    #[serde(serialize_with = "fixed::money")]
    pub bank_fee: Decimal,
    #[serde(serialize_with = "fixed::money")]
    pub net_after_bank: Decimal,
    #[serde(serialize_with = "fixed::money")]
    pub bridge_acquired: Decimal,
    #[serde(serialize_with = "fixed::money")]
    pub platform_fee: Decimal,
    #[serde(serialize_with = "fixed::money")]
    pub net_bridge: Decimal,
    /// Spread amount, in bridge units.
    #[serde(serialize_with = "fixed::money")]
    pub spread: Decimal,
    #[serde(serialize_with = "fixed::money")]
    pub final_bridge: Decimal,
    pub exchange_rate_used: ExchangeRatesUsed,
    /// Whether any override was supplied.
    pub is_custom: bool,
}

/// Outcome of a conversion, rounded for presentation.
///
/// Monetary fields carry 2 decimal places and rate fields 4; both serialize
/// as fixed-point strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    #[serde(serialize_with = "fixed::money")]
    pub original_amount: Decimal,
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub bridge_currency: Currency,
    pub direction: RouteDirection,
    #[serde(serialize_with = "fixed::money")]
    pub final_amount: Decimal,
    pub steps: ConversionSteps,
}

impl ConversionResult {
    /// Round a full-precision pipeline run at the output boundary.
    pub(crate) fn from_pipeline(
        pair: CurrencyPair,
        bridge: Currency,
        direction: RouteDirection,
        amount: Decimal,
        rates: &ResolvedRates,
        steps: &PipelineSteps,
    ) -> Self {
        Self {
            original_amount: round_money(amount),
            from_currency: pair.from,
            to_currency: pair.to,
            bridge_currency: bridge,
            direction,
            final_amount: round_money(steps.final_amount),
            steps: ConversionSteps {
                bank_fee: round_money(steps.bank_fee),
                net_after_bank: round_money(steps.net_after_bank),
                bridge_acquired: round_money(steps.bridge_acquired),
                platform_fee: round_money(steps.platform_fee),
                net_bridge: round_money(steps.net_bridge),
                spread: round_money(steps.spread),
                final_bridge: round_money(steps.final_bridge),
                exchange_rate_used: ExchangeRatesUsed {
                    from: round_rate(rates.exchange_rate),
                    to: round_rate(rates.target_exchange_rate),
                    platform_fee_rate: round_rate(rates.platform_fee_rate),
                    bank_fee_rate: round_rate(rates.bank_fee_rate),
                    spread_rate: round_rate(rates.spread_rate),
                },
                is_custom: rates.is_custom,
            },
        }
    }

    /// Ratio of delivered to original amount, `None` when it does not fit.
    pub fn effective_rate(&self) -> Option<Decimal> {
        self.final_amount.checked_div(self.original_amount).map(round_rate)
    }
}

/// Round a monetary amount, midpoint away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a rate or fee fraction, midpoint away from zero.
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Fixed-point string serializers.
mod fixed {
    use rust_decimal::Decimal;
    use serde::Serializer;

    use super::{MONEY_DP, RATE_DP};

    pub fn money<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:.*}", MONEY_DP as usize, value))
    }

    pub fn rate<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:.*}", RATE_DP as usize, value))
    }
}
