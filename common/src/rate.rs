//! Stored rate records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::monetary::Currency;
use crate::time::{now, Timestamp};

/// Classification of a stored currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    /// Reference currency, fixed at 1:1 parity. At most one per catalog.
    Base,
    /// Government-issued currency.
    #[default]
    Fiat,
    /// Crypto asset, e.g. a stablecoin used as bridge.
    Crypto,
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RateType::Base => "base",
            RateType::Fiat => "fiat",
            RateType::Crypto => "crypto",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RateType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base" => Ok(RateType::Base),
            "fiat" => Ok(RateType::Fiat),
            "crypto" => Ok(RateType::Crypto),
            _ => Err(ParseError::InvalidRateType(s.to_string())),
        }
    }
}

/// Tradable state of one currency at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    /// Currency code, unique within a catalog.
    pub code: Currency,
    /// Human-readable name.
    pub name: String,
    #[serde(default)]
    pub rate_type: RateType,
    /// Rate at which the desk buys this currency.
    pub buy_rate: Decimal,
    /// Rate at which the desk sells this currency.
    pub sell_rate: Decimal,
    /// Bank fee fraction, charged when this currency is the source.
    #[serde(default)]
    pub bank_fee: Decimal,
    /// Platform fee fraction, charged when this currency is the bridge.
    #[serde(default)]
    pub platform_fee: Decimal,
    /// Spread fraction, charged when this currency is the target.
    #[serde(default)]
    pub spread: Decimal,
    #[serde(default = "now")]
    pub last_updated: Timestamp,
}

impl RateRecord {
    /// Create a record with zero fees.
    pub fn new(
        code: Currency,
        name: impl Into<String>,
        rate_type: RateType,
        buy_rate: Decimal,
        sell_rate: Decimal,
    ) -> Self {
        Self {
            code,
            name: name.into(),
            rate_type,
            buy_rate,
            sell_rate,
            bank_fee: Decimal::ZERO,
            platform_fee: Decimal::ZERO,
            spread: Decimal::ZERO,
            last_updated: now(),
        }
    }

    /// Create a base record at 1:1 parity.
    pub fn base(code: Currency, name: impl Into<String>) -> Self {
        Self::new(code, name, RateType::Base, Decimal::ONE, Decimal::ONE)
    }

    /// Set the fee fractions.
    pub fn with_fees(mut self, bank_fee: Decimal, platform_fee: Decimal, spread: Decimal) -> Self {
        self.bank_fee = bank_fee;
        self.platform_fee = platform_fee;
        self.spread = spread;
        self
    }

    pub fn is_base(&self) -> bool {
        self.rate_type == RateType::Base
    }

    /// Whether buy and sell both sit at exactly 1.
    pub fn is_at_parity(&self) -> bool {
        self.buy_rate == Decimal::ONE && self.sell_rate == Decimal::ONE
    }

    /// Force 1:1 parity. No-op for non-base records.
    pub fn normalize_base(&mut self) {
        if self.is_base() {
            self.buy_rate = Decimal::ONE;
            self.sell_rate = Decimal::ONE;
        }
    }

    /// Midpoint between buy and sell, `None` on overflow.
    pub fn mid_rate(&self) -> Option<Decimal> {
        self.buy_rate.checked_add(self.sell_rate)?.checked_div(Decimal::TWO)
    }

    /// Distance between buy and sell as a percentage of the buy rate.
    ///
    /// `None` when the buy rate is zero or the figure does not fit.
    pub fn quoted_spread_pct(&self) -> Option<Decimal> {
        self.sell_rate
            .checked_sub(self.buy_rate)?
            .abs()
            .checked_div(self.buy_rate)?
            .checked_mul(Decimal::ONE_HUNDRED)
    }

    /// Refresh `last_updated`.
    pub fn touch(&mut self) {
        self.last_updated = now();
    }

    /// Iterate over the fee fractions with their field names.
    pub fn fees(&self) -> [(&'static str, Decimal); 3] {
        [
            ("bank_fee", self.bank_fee),
            ("platform_fee", self.platform_fee),
            ("spread", self.spread),
        ]
    }
}
