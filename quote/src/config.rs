//! Quote tool configuration.

use std::path::PathBuf;
use std::str::FromStr;

use cambio_fx::{CatalogConfig, ConversionEngineConfig, RateInvariant, SupportedPairs};
use rust_decimal::Decimal;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Plain,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "plain" => Ok(LogFormat::Plain),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Main quote tool configuration.
#[derive(Debug, Clone)]
pub struct QuoteConfig {
    /// Path to the catalog snapshot (JSON).
    pub catalog_path: PathBuf,
    /// Supported pairs, e.g. `BRL/BOB=forward,BOB/BRL=reverse`.
    pub supported_pairs: String,
    /// Buy/sell ordering, `buy-above-sell` or `sell-above-buy`.
    pub rate_invariant: String,
    /// Maximum quoted buy/sell spread for catalog writes, in percent.
    pub max_spread_pct: String,
    /// Log format, `json` or `plain`.
    pub log_format: String,
    /// Log level.
    pub log_level: String,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("rates.json"),
            supported_pairs: SupportedPairs::brl_bob().to_string(),
            rate_invariant: RateInvariant::default().to_string(),
            max_spread_pct: Decimal::TEN.to_string(),
            log_format: "plain".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl QuoteConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("CAMBIO_CATALOG_PATH") {
            config.catalog_path = PathBuf::from(path);
        }

        if let Ok(pairs) = std::env::var("CAMBIO_SUPPORTED_PAIRS") {
            config.supported_pairs = pairs;
        }

        if let Ok(invariant) = std::env::var("CAMBIO_RATE_INVARIANT") {
            config.rate_invariant = invariant;
        }

        if let Ok(pct) = std::env::var("CAMBIO_MAX_SPREAD_PCT") {
            config.max_spread_pct = pct;
        }

        if let Ok(format) = std::env::var("CAMBIO_LOG_FORMAT") {
            config.log_format = format;
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.catalog_path.as_os_str().is_empty() {
            return Err("Catalog path cannot be empty".to_string());
        }

        self.max_spread()?;
        self.log_format()?;
        self.pairs()?;
        self.invariant()?;

        Ok(())
    }

    /// Engine configuration derived from this config.
    pub fn engine_config(&self) -> Result<ConversionEngineConfig, String> {
        Ok(ConversionEngineConfig {
            pairs: self.pairs()?,
            rate_invariant: self.invariant()?,
        })
    }

    /// Catalog configuration derived from this config.
    pub fn catalog_config(&self) -> Result<CatalogConfig, String> {
        Ok(CatalogConfig {
            invariant: self.invariant()?,
            max_spread_pct: self.max_spread()?,
        })
    }

    /// Parsed log format.
    pub fn log_format(&self) -> Result<LogFormat, String> {
        self.log_format
            .parse::<LogFormat>()
            .map_err(|e| format!("Invalid log format: {}", e))
    }

    fn max_spread(&self) -> Result<Decimal, String> {
        let pct: Decimal = self
            .max_spread_pct
            .trim()
            .parse()
            .map_err(|_| format!("Invalid maximum spread: '{}'", self.max_spread_pct))?;
        if pct <= Decimal::ZERO {
            return Err("Maximum spread must be positive".to_string());
        }
        Ok(pct)
    }

    fn pairs(&self) -> Result<SupportedPairs, String> {
        self.supported_pairs
            .parse::<SupportedPairs>()
            .map_err(|e| format!("Invalid supported pairs: {}", e))
    }

    fn invariant(&self) -> Result<RateInvariant, String> {
        self.rate_invariant
            .parse::<RateInvariant>()
            .map_err(|e| format!("Invalid rate invariant: {}", e))
    }
}
