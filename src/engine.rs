//! Engine Module
//!
//! Cache-aside rate resolution used by every session.
//!
//! ## Responsibilities
//! - Serve rates from the store when cached
//! - On a miss, fetch upstream, populate the store, return the fetched rate
//! - Optionally collapse concurrent misses on the same key into one fetch

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{CurrencySymbol, MarketDate};
use crate::store::{InsertOutcome, RateStore};
use crate::upstream::RateSource;

type RateKey = (MarketDate, CurrencySymbol);

/// Resolves rates against the cache, falling back to upstream
///
/// ## Concurrency Model
///
/// - The store serializes its own access; the engine adds no lock around it
/// - Without dedup, two sessions missing the same key both fetch and both
///   insert; the store's insert-if-absent keeps one record and the other
///   write is dropped
/// - With dedup, misses on the same key queue on a per-key slot; the first
///   fetches, the rest re-check the store once it is done
pub struct Engine {
    /// Durable cache
    store: Arc<RateStore>,

    /// Upstream consulted on a miss
    source: Arc<dyn RateSource>,

    /// Per-key slots for misses currently being fetched
    in_flight: Mutex<HashMap<RateKey, Arc<Mutex<()>>>>,

    /// Whether misses on the same key are collapsed
    dedup_fetches: bool,
}

impl Engine {
    /// Create an engine over an open store and a rate source
    pub fn new(store: Arc<RateStore>, source: Arc<dyn RateSource>, config: &Config) -> Self {
        Self {
            store,
            source,
            in_flight: Mutex::new(HashMap::new()),
            dedup_fetches: config.dedup_fetches,
        }
    }

    /// Return the rate for a key, fetching and caching it on a miss
    pub fn get_or_fetch(&self, date: &MarketDate, currency: &CurrencySymbol) -> Result<f64> {
        if let Some(rate) = self.store.lookup(date.as_str(), currency.as_str())? {
            tracing::debug!("Cache hit for {} {}", date, currency);
            return Ok(rate);
        }

        if !self.dedup_fetches {
            return self.fetch_and_store(date, currency);
        }

        let key = (date.clone(), currency.clone());
        let slot = {
            let mut in_flight = self.in_flight.lock();
            Arc::clone(in_flight.entry(key.clone()).or_default())
        };

        let result = {
            let _turn = slot.lock();
            match self.store.lookup(date.as_str(), currency.as_str()) {
                Ok(Some(rate)) => {
                    tracing::debug!("Rate for {} {} cached by a concurrent fetch", date, currency);
                    Ok(rate)
                }
                Ok(None) => self.fetch_and_store(date, currency),
                Err(e) => Err(e),
            }
        };

        drop(slot);

        // Only the map still holds the slot: nobody else is waiting on this key
        let mut in_flight = self.in_flight.lock();
        if in_flight.get(&key).map_or(false, |slot| Arc::strong_count(slot) == 1) {
            in_flight.remove(&key);
        }

        result
    }

    /// Fetch upstream and write the rate back
    ///
    /// The fetched rate is returned even when the write loses a race or fails.
    fn fetch_and_store(&self, date: &MarketDate, currency: &CurrencySymbol) -> Result<f64> {
        tracing::debug!("Cache miss for {} {}, fetching upstream", date, currency);
        let rate = self.source.fetch(date, currency)?;

        match self.store.insert(date.as_str(), currency.as_str(), rate) {
            Ok(InsertOutcome::Inserted) => {
                tracing::debug!("Cached {} {} = {}", date, currency, rate);
            }
            Ok(InsertOutcome::AlreadyExists) => {
                tracing::debug!("Rate for {} {} was cached concurrently", date, currency);
            }
            Err(e) => {
                tracing::warn!("Failed to cache {} {}: {}", date, currency, e);
            }
        }

        Ok(rate)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the underlying store
    pub fn store(&self) -> &Arc<RateStore> {
        &self.store
    }

    /// Number of keys with a fetch currently in progress
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }
}
