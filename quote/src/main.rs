//! Cambio Quote Binary
//!
//! Quotes multi-hop conversions against a catalog snapshot.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{error, info};

use cambio_fx::RateOverrides;
use cambio_quote::{execute, load_catalog, logging, Command, LogFormat, QuoteConfig};

/// Cambio quote CLI
#[derive(Parser, Debug)]
#[command(name = "quote")]
#[command(about = "Quote currency conversions through the bridge currency")]
struct Args {
    /// Catalog snapshot path (overrides CAMBIO_CATALOG_PATH)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert an amount along a supported pair
    Convert {
        /// Source currency code
        #[arg(long)]
        from: String,

        /// Target currency code
        #[arg(long)]
        to: String,

        /// Amount in the source currency
        #[arg(long, allow_negative_numbers = true)]
        amount: Decimal,

        /// Bank fee fraction override
        #[arg(long)]
        bank_fee_rate: Option<Decimal>,

        /// Platform fee fraction override
        #[arg(long)]
        platform_fee_rate: Option<Decimal>,

        /// Spread fraction override
        #[arg(long)]
        spread_rate: Option<Decimal>,

        /// Source exchange rate override
        #[arg(long)]
        exchange_rate: Option<Decimal>,

        /// Target exchange rate override
        #[arg(long)]
        target_exchange_rate: Option<Decimal>,
    },

    /// Show stored rates, all or for one currency
    Rates {
        /// Currency code
        code: Option<String>,
    },

    /// List supported directed pairs
    Pairs,
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Convert {
                from,
                to,
                amount,
                bank_fee_rate,
                platform_fee_rate,
                spread_rate,
                exchange_rate,
                target_exchange_rate,
            } => Command::Convert {
                from,
                to,
                amount,
                overrides: RateOverrides {
                    bank_fee_rate,
                    platform_fee_rate,
                    spread_rate,
                    exchange_rate,
                    target_exchange_rate,
                },
            },
            Commands::Rates { code } => Command::Rates { code },
            Commands::Pairs => Command::Pairs,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = QuoteConfig::from_env();
    if let Some(path) = args.catalog {
        config.catalog_path = path;
    }

    // An unknown format still gets plain logs so validation can report it.
    logging::init_logging(config.log_format().unwrap_or(LogFormat::Plain), &config.log_level);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let engine_config = config.engine_config().map_err(anyhow::Error::msg)?;
    let catalog_config = config.catalog_config().map_err(anyhow::Error::msg)?;

    let catalog = Arc::new(load_catalog(&config.catalog_path, catalog_config).await?);

    info!(
        catalog = %config.catalog_path.display(),
        bridge = %catalog.bridge(),
        pairs = %engine_config.pairs,
        "Catalog ready"
    );

    let output = execute(args.command.into(), catalog, engine_config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
