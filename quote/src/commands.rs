//! Command execution.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use cambio_common::Currency;
use cambio_fx::{
    CatalogConfig, CatalogSnapshot, ConversionEngine, ConversionEngineConfig, ConversionRequest,
    InMemoryRateCatalog, RateOverrides,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// A parsed command, independent of the CLI layer.
#[derive(Debug, Clone)]
pub enum Command {
    Convert {
        from: String,
        to: String,
        amount: Decimal,
        overrides: RateOverrides,
    },
    Rates {
        code: Option<String>,
    },
    Pairs,
}

#[derive(Debug, Serialize)]
struct PairEntry {
    pair: String,
    direction: String,
}

/// Read and load a catalog snapshot file.
pub async fn load_catalog(path: &Path, config: CatalogConfig) -> anyhow::Result<InMemoryRateCatalog> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;

    parse_catalog(&raw, config).with_context(|| format!("Failed to load catalog {}", path.display()))
}

/// Parse a catalog snapshot from JSON text.
pub fn parse_catalog(raw: &str, config: CatalogConfig) -> anyhow::Result<InMemoryRateCatalog> {
    let snapshot: CatalogSnapshot = serde_json::from_str(raw).context("Malformed catalog snapshot")?;
    Ok(InMemoryRateCatalog::from_snapshot(snapshot, config)?)
}

/// Run a command and return its JSON output.
pub async fn execute(
    command: Command,
    catalog: Arc<InMemoryRateCatalog>,
    engine_config: ConversionEngineConfig,
) -> anyhow::Result<Value> {
    match command {
        Command::Convert {
            from,
            to,
            amount,
            overrides,
        } => {
            let engine = ConversionEngine::new(catalog, engine_config);
            let request =
                ConversionRequest::new(Currency::new(from), Currency::new(to), amount).with_overrides(overrides);

            let result = engine.convert(request).await.context("Conversion failed")?;
            Ok(serde_json::to_value(result)?)
        }
        Command::Rates { code: Some(code) } => {
            let quote = catalog.quote(&Currency::new(code))?;
            Ok(serde_json::to_value(quote)?)
        }
        Command::Rates { code: None } => {
            let quotes = catalog.quotes();
            info!(count = quotes.len(), "Listing rates");
            Ok(serde_json::to_value(quotes)?)
        }
        Command::Pairs => {
            let pairs: Vec<PairEntry> = engine_config
                .pairs
                .routes()
                .map(|(pair, direction)| PairEntry {
                    pair: pair.to_string(),
                    direction: direction.to_string(),
                })
                .collect();
            Ok(serde_json::to_value(pairs)?)
        }
    }
}
