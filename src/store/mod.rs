//! Store Module
//!
//! Durable rate cache.
//!
//! ## Responsibilities
//! - Point lookups by `(market_date, currency_symbol)`
//! - Insert-if-absent (cache entries are immutable once written)
//! - All-or-nothing clear for cache maintenance
//!
//! ## Schema
//! ```text
//! exchange_rates
//! ┌────┬─────────────┬─────────────────┬───────────────┐
//! │ id │ market_date │ currency_symbol │ currency_rate │
//! └────┴─────────────┴─────────────────┴───────────────┘
//!        UNIQUE (market_date, currency_symbol)
//! ```

mod record;
mod rate_store;

pub use record::{ExchangeRate, InsertOutcome};
pub use rate_store::RateStore;
