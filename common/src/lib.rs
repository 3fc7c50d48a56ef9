//! Cambio Common Types
//!
//! Shared value types used across the Cambio workspace: currency codes,
//! directed currency pairs, and the stored rate record of a currency.

pub mod error;
pub mod monetary;
pub mod rate;
pub mod time;

pub use error::*;
pub use monetary::*;
pub use rate::*;
pub use time::*;
