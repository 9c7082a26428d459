//! HTTP rate source
//!
//! Queries the rates API: `GET {base_url}/api/{date}?base={base}&symbols={currency}`
//! which answers with
//!
//! ```text
//! {"date": "2024-05-01", "base": "USD", "rates": {"EUR": 0.92}}
//! ```

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{RateError, Result};
use crate::protocol::{CurrencySymbol, MarketDate};

use super::RateSource;

/// Body returned by the rates API
#[derive(Debug, Deserialize)]
pub struct RatesPayload {
    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub base: Option<String>,

    pub rates: HashMap<String, f64>,
}

impl RatesPayload {
    /// Pull one currency out of the payload
    pub fn rate_for(&self, currency: &str) -> Result<f64> {
        self.rates.get(currency).copied().ok_or_else(|| {
            RateError::UpstreamBadResponse(format!("currency {} missing from response", currency))
        })
    }
}

/// Blocking HTTP client for the upstream rates API
pub struct HttpRateSource {
    client: Client,
    base_url: String,
    base_currency: String,
}

impl HttpRateSource {
    /// Build a client with the timeout and base currency from `config`
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.upstream_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.upstream_url.trim_end_matches('/').to_string(),
            base_currency: config.base_currency.clone(),
        })
    }

    /// URL queried for a date
    pub fn endpoint(&self, date: &MarketDate) -> String {
        format!("{}/api/{}", self.base_url, date)
    }
}

impl RateSource for HttpRateSource {
    fn fetch(&self, date: &MarketDate, currency: &CurrencySymbol) -> Result<f64> {
        let url = self.endpoint(date);
        tracing::debug!("Fetching {} on {} from {}", currency, date, url);

        let response = self
            .client
            .get(&url)
            .query(&[("base", self.base_currency.as_str()), ("symbols", currency.as_str())])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::UpstreamBadResponse(format!(
                "{} answered {}",
                url, status
            )));
        }

        let body = response.text()?;
        let payload: RatesPayload = serde_json::from_str(&body)
            .map_err(|e| RateError::UpstreamBadResponse(format!("malformed body: {}", e)))?;

        payload.rate_for(currency.as_str())
    }
}
