//! Fee and spread pipeline.
//!
//! All arithmetic runs at full decimal precision; rounding belongs to the
//! output boundary in [`crate::conversion`].

use cambio_common::RateRecord;
use rust_decimal::Decimal;

use crate::conversion::RateOverrides;
use crate::error::{FxError, FxResult};
use crate::pairs::RouteDirection;

/// Effective parameters of one conversion after override resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRates {
    pub bank_fee_rate: Decimal,
    pub platform_fee_rate: Decimal,
    pub spread_rate: Decimal,
    pub exchange_rate: Decimal,
    pub target_exchange_rate: Decimal,
    /// Whether any override was supplied.
    pub is_custom: bool,
}

impl ResolvedRates {
    /// Pick each parameter from the overrides, falling back to the record
    /// that owns it: bank fee from the source, platform fee from the bridge,
    /// spread from the target, exchange rate from the source's buy rate and
    /// target rate from the target's sell rate.
    pub fn resolve(
        overrides: &RateOverrides,
        from: &RateRecord,
        to: &RateRecord,
        bridge: &RateRecord,
    ) -> Self {
        Self {
            bank_fee_rate: overrides.bank_fee_rate.unwrap_or(from.bank_fee),
            platform_fee_rate: overrides.platform_fee_rate.unwrap_or(bridge.platform_fee),
            spread_rate: overrides.spread_rate.unwrap_or(to.spread),
            exchange_rate: overrides.exchange_rate.unwrap_or(from.buy_rate),
            target_exchange_rate: overrides.target_exchange_rate.unwrap_or(to.sell_rate),
            is_custom: !overrides.is_empty(),
        }
    }
}

/// Unrounded intermediate values of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSteps {
    pub bank_fee: Decimal,
    pub net_after_bank: Decimal,
    pub bridge_acquired: Decimal,
    pub platform_fee: Decimal,
    pub net_bridge: Decimal,
    pub spread: Decimal,
    pub final_bridge: Decimal,
    pub final_amount: Decimal,
}

impl PipelineSteps {
    /// Run the pipeline for `amount` of the source currency.
    pub fn run(amount: Decimal, rates: &ResolvedRates, direction: RouteDirection) -> FxResult<Self> {
        let bank_fee = mul(amount, rates.bank_fee_rate, "bankFee")?;
        let net_after_bank = sub(amount, bank_fee, "netAfterBank")?;

        let bridge_acquired = hop(net_after_bank, rates.exchange_rate, direction, "bridgeAcquired")?;

        let platform_fee = mul(bridge_acquired, rates.platform_fee_rate, "platformFee")?;
        let net_bridge = sub(bridge_acquired, platform_fee, "netBridge")?;

        let spread = mul(net_bridge, rates.spread_rate, "spread")?;
        let final_bridge = sub(net_bridge, spread, "finalBridge")?;

        let final_amount = hop(final_bridge, rates.target_exchange_rate, direction, "finalAmount")?;

        Ok(Self {
            bank_fee,
            net_after_bank,
            bridge_acquired,
            platform_fee,
            net_bridge,
            spread,
            final_bridge,
            final_amount,
        })
    }
}

/// Forward divides by the rate, reverse multiplies.
fn hop(value: Decimal, rate: Decimal, direction: RouteDirection, step: &'static str) -> FxResult<Decimal> {
    match direction {
        RouteDirection::Forward => value.checked_div(rate),
        RouteDirection::Reverse => value.checked_mul(rate),
    }
    .ok_or(FxError::ArithmeticOverflow(step))
}

fn mul(a: Decimal, b: Decimal, step: &'static str) -> FxResult<Decimal> {
    a.checked_mul(b).ok_or(FxError::ArithmeticOverflow(step))
}

fn sub(a: Decimal, b: Decimal, step: &'static str) -> FxResult<Decimal> {
    a.checked_sub(b).ok_or(FxError::ArithmeticOverflow(step))
}
