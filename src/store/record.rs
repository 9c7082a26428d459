//! ExchangeRate record

use std::fmt;

/// A cached rate, keyed by `(market_date, currency_symbol)`
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRate {
    /// Surrogate id assigned by the store
    pub id: i64,

    /// `YYYY-MM-DD`
    pub market_date: String,

    /// Three-letter uppercase code
    pub currency_symbol: String,

    /// Rate of `currency_symbol` against the base currency
    pub currency_rate: f64,
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<ExchangeRate Id={}, MarketDate={}, CurrencySymbol={}, CurrencyRate={}>",
            self.id, self.market_date, self.currency_symbol, self.currency_rate
        )
    }
}

/// Outcome of an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new record was written
    Inserted,

    /// A record for the key already existed and was left untouched
    AlreadyExists,
}
