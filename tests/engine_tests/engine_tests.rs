//! Tests for Engine
//!
//! These tests verify:
//! - Cache-aside: one upstream fetch per key, then cache hits
//! - Clear forces a fresh fetch
//! - Upstream failures surface and leave the cache untouched
//! - Concurrent misses on one key, with and without dedup

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use ratecache::protocol::{CurrencySymbol, MarketDate};
use ratecache::RateError;

#[path = "../common/mod.rs"]
mod common;

use common::{setup_engine, MockRateSource, UnavailableSource};

fn key(date: &str, currency: &str) -> (MarketDate, CurrencySymbol) {
    (date.parse().unwrap(), currency.parse().unwrap())
}

// =============================================================================
// Cache-aside Tests
// =============================================================================

#[test]
fn test_first_lookup_fetches_and_caches() {
    let source = Arc::new(MockRateSource::new().with_rate("2024-05-01", "EUR", 0.92));
    let (_temp, engine) = setup_engine(source.clone(), true);
    let (date, currency) = key("2024-05-01", "EUR");

    assert_eq!(engine.get_or_fetch(&date, &currency).unwrap(), 0.92);

    assert_eq!(source.calls(), 1);
    assert_eq!(engine.store().lookup("2024-05-01", "EUR").unwrap(), Some(0.92));
}

#[test]
fn test_repeated_lookups_hit_cache() {
    let source = Arc::new(MockRateSource::new().with_rate("2024-05-01", "EUR", 0.92));
    let (_temp, engine) = setup_engine(source.clone(), true);
    let (date, currency) = key("2024-05-01", "EUR");

    for _ in 0..5 {
        assert_eq!(engine.get_or_fetch(&date, &currency).unwrap(), 0.92);
    }

    assert_eq!(source.calls(), 1);
    assert_eq!(engine.store().count().unwrap(), 1);
}

#[test]
fn test_cached_rate_wins_over_changed_upstream() {
    let source = Arc::new(MockRateSource::new().with_rate("2024-05-01", "EUR", 0.92));
    let (_temp, engine) = setup_engine(source.clone(), true);
    let (date, currency) = key("2024-05-01", "EUR");

    engine.get_or_fetch(&date, &currency).unwrap();
    source.set_rate("2024-05-01", "EUR", 0.99);

    assert_eq!(engine.get_or_fetch(&date, &currency).unwrap(), 0.92);
}

#[test]
fn test_clear_forces_fresh_fetch() {
    let source = Arc::new(MockRateSource::new().with_rate("2024-05-01", "EUR", 0.92));
    let (_temp, engine) = setup_engine(source.clone(), true);
    let (date, currency) = key("2024-05-01", "EUR");

    engine.get_or_fetch(&date, &currency).unwrap();
    assert_eq!(engine.store().clear().unwrap(), 1);
    source.set_rate("2024-05-01", "EUR", 0.95);

    assert_eq!(engine.get_or_fetch(&date, &currency).unwrap(), 0.95);
    assert_eq!(source.calls(), 2);
}

#[test]
fn test_pre_cached_rate_needs_no_upstream() {
    let source = Arc::new(MockRateSource::new());
    let (_temp, engine) = setup_engine(source.clone(), true);
    engine.store().insert("2024-05-01", "GBP", 0.80).unwrap();
    let (date, currency) = key("2024-05-01", "GBP");

    assert_eq!(engine.get_or_fetch(&date, &currency).unwrap(), 0.80);
    assert_eq!(source.calls(), 0);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_missing_currency_is_bad_response() {
    let source = Arc::new(MockRateSource::new());
    let (_temp, engine) = setup_engine(source.clone(), true);
    let (date, currency) = key("2024-05-01", "XYZ");

    let err = engine.get_or_fetch(&date, &currency).unwrap_err();

    assert!(matches!(err, RateError::UpstreamBadResponse(_)));
    assert_eq!(engine.store().count().unwrap(), 0);
    assert_eq!(engine.in_flight_count(), 0);
}

#[test]
fn test_unavailable_upstream_is_not_cached() {
    let (_temp, engine) = setup_engine(Arc::new(UnavailableSource), true);
    let (date, currency) = key("2024-05-01", "EUR");

    for _ in 0..2 {
        let err = engine.get_or_fetch(&date, &currency).unwrap_err();
        assert!(matches!(err, RateError::UpstreamUnavailable(_)));
    }
    assert_eq!(engine.store().count().unwrap(), 0);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

fn concurrent_misses(dedup: bool, threads: usize) -> (Arc<MockRateSource>, Vec<f64>, usize) {
    let source = Arc::new(
        MockRateSource::new()
            .with_rate("2024-05-01", "EUR", 0.92)
            .with_delay(Duration::from_millis(100)),
    );
    let (_temp, engine) = setup_engine(source.clone(), dedup);
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let (date, currency) = key("2024-05-01", "EUR");
                barrier.wait();
                engine.get_or_fetch(&date, &currency).unwrap()
            })
        })
        .collect();

    let rates = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let stored = engine.store().count().unwrap();
    assert_eq!(engine.in_flight_count(), 0);
    (source, rates, stored)
}

#[test]
fn test_concurrent_misses_with_dedup_fetch_once() {
    let (source, rates, stored) = concurrent_misses(true, 8);

    assert!(rates.iter().all(|r| *r == 0.92));
    assert_eq!(source.calls(), 1);
    assert_eq!(stored, 1);
}

#[test]
fn test_concurrent_misses_without_dedup_keep_one_record() {
    let (source, rates, stored) = concurrent_misses(false, 8);

    assert!(rates.iter().all(|r| *r == 0.92));
    // Every racer may fetch; the store still holds one record
    assert!(source.calls() >= 1);
    assert_eq!(stored, 1);
}

#[test]
fn test_in_flight_slots_reclaimed_after_contention() {
    // Misses that fail are never cached, so every call queues on the slot
    let source = Arc::new(MockRateSource::new().with_delay(Duration::from_millis(1)));
    let (_temp, engine) = setup_engine(source.clone(), true);
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let symbol = if i % 2 == 0 { "XYZ" } else { "QQQ" };
                let (date, currency) = key("2024-05-01", symbol);
                barrier.wait();
                for _ in 0..25 {
                    assert!(engine.get_or_fetch(&date, &currency).is_err());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(source.calls(), threads * 25);
    assert_eq!(engine.in_flight_count(), 0);
}

#[test]
fn test_dedup_does_not_serialize_distinct_keys() {
    let source = Arc::new(
        MockRateSource::new()
            .with_rate("2024-05-01", "EUR", 0.92)
            .with_rate("2024-05-01", "GBP", 0.80)
            .with_delay(Duration::from_millis(50)),
    );
    let (_temp, engine) = setup_engine(source.clone(), true);

    let handles: Vec<_> = ["EUR", "GBP"]
        .into_iter()
        .map(|symbol| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let (date, currency) = key("2024-05-01", symbol);
                engine.get_or_fetch(&date, &currency).unwrap()
            })
        })
        .collect();

    let mut rates: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    rates.sort_by(|a, b| a.partial_cmp(b).unwrap());

    assert_eq!(rates, vec![0.80, 0.92]);
    assert_eq!(source.calls(), 2);
}
