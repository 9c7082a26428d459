//! Upstream Module
//!
//! Source of truth consulted on a cache miss.

mod http;

pub use http::{HttpRateSource, RatesPayload};

use crate::error::Result;
use crate::protocol::{CurrencySymbol, MarketDate};

/// Provides the rate of a currency on a date against a fixed base currency
///
/// Implementations must bound how long `fetch` can block.
pub trait RateSource: Send + Sync {
    fn fetch(&self, date: &MarketDate, currency: &CurrencySymbol) -> Result<f64>;
}
