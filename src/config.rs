//! Configuration for RateCache
//!
//! Centralized configuration with sensible defaults. Host and port are a
//! static pair fixed at startup; there is no dynamic reconfiguration.

use std::path::PathBuf;

use crate::error::{RateError, Result};

/// Main configuration for a RateCache server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Host the acceptor binds to
    pub host: String,

    /// Port the acceptor binds to (0 picks an ephemeral port)
    pub port: u16,

    /// Max concurrent client sessions (0 = unbounded)
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = wait forever)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = wait forever)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// SQLite database backing the rate cache
    pub database_path: PathBuf,

    /// Snapshot file the server publishes its status to
    pub status_path: PathBuf,

    /// How often the status snapshot is refreshed even without changes
    pub status_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Upstream Configuration
    // -------------------------------------------------------------------------
    /// Base URL of the upstream rates API
    pub upstream_url: String,

    /// Currency every rate is quoted against
    pub base_currency: String,

    /// Bound on a single upstream request (milliseconds)
    pub upstream_timeout_ms: u64,

    /// Collapse concurrent cache misses on the same key into one fetch
    pub dedup_fetches: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5050,
            max_connections: 0,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
            database_path: PathBuf::from("./ratecache_data/rates.db"),
            status_path: PathBuf::from("./ratecache_data/server.status"),
            status_interval_ms: 500,
            upstream_url: "http://127.0.0.1:8080".to_string(),
            base_currency: "USD".to_string(),
            upstream_timeout_ms: 30_000,
            dedup_fetches: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The `host:port` pair the acceptor binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(RateError::Config("host must not be empty".to_string()));
        }

        let base = self.base_currency.as_bytes();
        if base.len() != 3 || !base.iter().all(u8::is_ascii_uppercase) {
            return Err(RateError::Config(format!(
                "base currency must be three uppercase letters, got {:?}",
                self.base_currency
            )));
        }

        if self.upstream_timeout_ms == 0 {
            return Err(RateError::Config(
                "upstream timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the bind host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the bind port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the maximum number of concurrent sessions
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the SQLite database path
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database_path = path.into();
        self
    }

    /// Set the status snapshot path
    pub fn status_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.status_path = path.into();
        self
    }

    /// Set the status refresh interval (in milliseconds)
    pub fn status_interval_ms(mut self, ms: u64) -> Self {
        self.config.status_interval_ms = ms;
        self
    }

    /// Set the upstream API base URL
    pub fn upstream_url(mut self, url: impl Into<String>) -> Self {
        self.config.upstream_url = url.into();
        self
    }

    /// Set the base currency
    pub fn base_currency(mut self, currency: impl Into<String>) -> Self {
        self.config.base_currency = currency.into();
        self
    }

    /// Set the upstream request timeout (in milliseconds)
    pub fn upstream_timeout_ms(mut self, ms: u64) -> Self {
        self.config.upstream_timeout_ms = ms;
        self
    }

    /// Enable or disable in-flight fetch deduplication
    pub fn dedup_fetches(mut self, enabled: bool) -> Self {
        self.config.dedup_fetches = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
