//! Cambio Quote
//!
//! Command-line front end that loads a catalog snapshot and runs the
//! conversion engine, printing JSON to stdout.

pub mod commands;
pub mod config;
pub mod logging;

pub use commands::{execute, load_catalog, Command};
pub use config::{LogFormat, QuoteConfig};
