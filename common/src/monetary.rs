//! Currency codes and directed currency pairs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Currency code, e.g. `BRL`, `BOB` or `USDT`.
///
/// Codes are stored upper-cased. A well-formed code is 3 or 4 ASCII
/// letters; [`Currency::parse`] enforces that, [`Currency::new`] does not.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    /// Create a currency, rejecting malformed codes.
    pub fn parse(code: &str) -> Result<Self, ParseError> {
        let currency = Self::new(code);
        if currency.is_valid() {
            Ok(currency)
        } else {
            Err(ParseError::InvalidCurrencyCode(code.to_string()))
        }
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Check the code is 3-4 uppercase ASCII letters.
    pub fn is_valid(&self) -> bool {
        (3..=4).contains(&self.0.len()) && self.0.chars().all(|c| c.is_ascii_uppercase())
    }

    pub fn brl() -> Self {
        Self::new("BRL")
    }

    pub fn bob() -> Self {
        Self::new("BOB")
    }

    pub fn usdt() -> Self {
        Self::new("USDT")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl FromStr for Currency {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A directed currency pair: money flows from `from` into `to`.
///
/// `BRL/BOB` and `BOB/BRL` are distinct pairs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Currency being sold by the customer.
    pub from: Currency,
    /// Currency delivered to the customer.
    pub to: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(from: Currency, to: Currency) -> Self {
        Self { from, to }
    }

    /// Get the inverse pair.
    pub fn inverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }

    /// Whether both legs name the same currency.
    pub fn is_degenerate(&self) -> bool {
        self.from == self.to
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

impl FromStr for CurrencyPair {
    type Err = ParseError;

    /// Parse `FROM/TO`, e.g. `BRL/BOB`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s
            .split_once('/')
            .ok_or_else(|| ParseError::InvalidCurrencyPair(s.to_string()))?;

        let from =
            Currency::parse(from).map_err(|_| ParseError::InvalidCurrencyPair(s.to_string()))?;
        let to = Currency::parse(to).map_err(|_| ParseError::InvalidCurrencyPair(s.to_string()))?;

        Ok(Self::new(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_normalizes_case() {
        assert_eq!(Currency::new(" brl ").code(), "BRL");
        assert_eq!(Currency::new("usdt"), Currency::usdt());
    }

    #[test]
    fn test_currency_validation() {
        assert!(Currency::parse("BRL").is_ok());
        assert!(Currency::parse("usdt").is_ok());
        assert!(Currency::parse("BR").is_err());
        assert!(Currency::parse("EUROS").is_err());
        assert!(Currency::parse("U5D").is_err());
        assert!(!Currency::new("").is_valid());
    }

    #[test]
    fn test_pair_parse_and_display() {
        let pair: CurrencyPair = "brl/BOB".parse().unwrap();

        assert_eq!(pair, CurrencyPair::new(Currency::brl(), Currency::bob()));
        assert_eq!(pair.to_string(), "BRL/BOB");
        assert_eq!(pair.inverse().to_string(), "BOB/BRL");
    }

    #[test]
    fn test_pair_parse_rejects_malformed() {
        assert!("BRLBOB".parse::<CurrencyPair>().is_err());
        assert!("BRL/".parse::<CurrencyPair>().is_err());
        assert!("BRL/B0B".parse::<CurrencyPair>().is_err());
    }

    #[test]
    fn test_pair_is_directed() {
        let pair = CurrencyPair::new(Currency::brl(), Currency::bob());

        assert_ne!(pair, pair.inverse());
        assert!(!pair.is_degenerate());
        assert!(CurrencyPair::new(Currency::brl(), Currency::brl()).is_degenerate());
    }
}
