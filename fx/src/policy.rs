//! Rate validation policy.
//!
//! A deployment quotes buy/sell in one fixed orientation. [`RateInvariant`]
//! names that orientation and every record the engine touches is checked
//! against it before any arithmetic runs.

use cambio_common::RateRecord;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::error::{FxError, FxResult};

/// Required strict ordering between `buy_rate` and `sell_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RateInvariant {
    /// `buy_rate > sell_rate`.
    #[default]
    BuyAboveSell,
    /// `sell_rate > buy_rate`.
    SellAboveBuy,
}

impl RateInvariant {
    /// Check the ordering of a buy/sell couple. Both must be positive.
    pub fn holds(&self, buy_rate: Decimal, sell_rate: Decimal) -> bool {
        if buy_rate <= Decimal::ZERO || sell_rate <= Decimal::ZERO {
            return false;
        }
        match self {
            RateInvariant::BuyAboveSell => buy_rate > sell_rate,
            RateInvariant::SellAboveBuy => sell_rate > buy_rate,
        }
    }

    /// Validate the rates of a stored record.
    ///
    /// Base records are exempt from strict ordering but must sit at 1:1.
    pub fn check(&self, record: &RateRecord) -> FxResult<()> {
        let ok = if record.is_base() {
            record.is_at_parity()
        } else {
            self.holds(record.buy_rate, record.sell_rate)
        };

        if ok {
            Ok(())
        } else {
            Err(FxError::InvalidRateConfiguration {
                currency: record.code.clone(),
                buy_rate: record.buy_rate,
                sell_rate: record.sell_rate,
                invariant: *self,
            })
        }
    }
}

impl fmt::Display for RateInvariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateInvariant::BuyAboveSell => write!(f, "buy-above-sell"),
            RateInvariant::SellAboveBuy => write!(f, "sell-above-buy"),
        }
    }
}

impl FromStr for RateInvariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy-above-sell" | "buy_above_sell" => Ok(RateInvariant::BuyAboveSell),
            "sell-above-buy" | "sell_above_buy" => Ok(RateInvariant::SellAboveBuy),
            other => Err(format!("unknown rate invariant {:?}", other)),
        }
    }
}

/// Whether a fee fraction lies in `[0, 1)`.
pub fn is_valid_fraction(value: Decimal) -> bool {
    value >= Decimal::ZERO && value < Decimal::ONE
}

/// Validate every fee fraction of a stored record.
pub fn check_fees(record: &RateRecord) -> FxResult<()> {
    for (fee, value) in record.fees() {
        if !is_valid_fraction(value) {
            return Err(FxError::InvalidFeeConfiguration {
                currency: record.code.clone(),
                fee,
                value,
            });
        }
    }
    Ok(())
}

/// Full validation of a stored record: rates, then fees.
pub fn check_record(invariant: RateInvariant, record: &RateRecord) -> FxResult<()> {
    invariant.check(record)?;
    check_fees(record)
}
