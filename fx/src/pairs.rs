//! Supported directed pairs and their routing through the bridge currency.

use cambio_common::{Currency, CurrencyPair};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Which way a pair hops through the bridge.
///
/// Forward routes divide by the source rate and by the target rate; reverse
/// routes multiply at both hops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteDirection {
    Forward,
    Reverse,
}

impl fmt::Display for RouteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteDirection::Forward => write!(f, "forward"),
            RouteDirection::Reverse => write!(f, "reverse"),
        }
    }
}

impl FromStr for RouteDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(RouteDirection::Forward),
            "reverse" => Ok(RouteDirection::Reverse),
            other => Err(format!("unknown route direction {:?}", other)),
        }
    }
}

/// Allow-list of directed pairs, each with its route direction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SupportedPairs {
    routes: BTreeMap<CurrencyPair, RouteDirection>,
}

impl SupportedPairs {
    /// Create an empty allow-list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pair, rejecting `X/X`. Re-adding a pair replaces its direction.
    pub fn insert(&mut self, pair: CurrencyPair, direction: RouteDirection) -> Result<(), String> {
        if pair.is_degenerate() {
            return Err(format!("pair {} converts a currency into itself", pair));
        }
        self.routes.insert(pair, direction);
        Ok(())
    }

    /// Builder-style [`SupportedPairs::insert`].
    pub fn with(mut self, from: &str, to: &str, direction: RouteDirection) -> Result<Self, String> {
        self.insert(CurrencyPair::new(Currency::new(from), Currency::new(to)), direction)?;
        Ok(self)
    }

    /// Route direction for a pair, if supported.
    pub fn direction(&self, pair: &CurrencyPair) -> Option<RouteDirection> {
        self.routes.get(pair).copied()
    }

    pub fn contains(&self, pair: &CurrencyPair) -> bool {
        self.routes.contains_key(pair)
    }

    /// All supported pairs, ordered.
    pub fn pairs(&self) -> Vec<CurrencyPair> {
        self.routes.keys().cloned().collect()
    }

    /// Pairs with their directions, ordered.
    pub fn routes(&self) -> impl Iterator<Item = (&CurrencyPair, RouteDirection)> {
        self.routes.iter().map(|(pair, direction)| (pair, *direction))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// `BRL/BOB` forward and `BOB/BRL` reverse.
    pub fn brl_bob() -> Self {
        let mut pairs = Self::new();
        pairs.routes.insert(
            CurrencyPair::new(Currency::brl(), Currency::bob()),
            RouteDirection::Forward,
        );
        pairs.routes.insert(
            CurrencyPair::new(Currency::bob(), Currency::brl()),
            RouteDirection::Reverse,
        );
        pairs
    }
}

impl fmt::Display for SupportedPairs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .routes()
            .map(|(pair, direction)| format!("{}={}", pair, direction))
            .collect();
        write!(f, "{}", entries.join(","))
    }
}

impl FromStr for SupportedPairs {
    type Err = String;

    /// Parse `BRL/BOB=forward,BOB/BRL=reverse`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut pairs = Self::new();

        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (pair, direction) = entry
                .split_once('=')
                .ok_or_else(|| format!("missing route direction in {:?}", entry))?;

            let pair: CurrencyPair = pair.trim().parse().map_err(|e| format!("{}", e))?;
            pairs.insert(pair, direction.parse()?)?;
        }

        if pairs.is_empty() {
            return Err("no supported pairs configured".to_string());
        }

        Ok(pairs)
    }
}
