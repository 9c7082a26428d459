//! Command-line arguments shared by the server and the control shell
//!
//! The shell launches the server binary with the same flags it was given,
//! so both sides parse through this one definition.

use std::path::PathBuf;

use clap::Args;

use crate::config::Config;

/// Server settings accepted on the command line
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ServerArgs {
    /// Host to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind
    #[arg(short, long, default_value_t = 5050)]
    pub port: u16,

    /// SQLite database holding cached rates
    #[arg(short, long, default_value = "./ratecache_data/rates.db")]
    pub database: PathBuf,

    /// Status file published by the running server
    #[arg(long, default_value = "./ratecache_data/server.status")]
    pub status_file: PathBuf,

    /// Base URL of the upstream rates API
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    pub upstream_url: String,

    /// Currency all rates are quoted against
    #[arg(short, long, default_value = "USD")]
    pub base_currency: String,

    /// Upstream request timeout in milliseconds
    #[arg(long, default_value_t = 30_000)]
    pub upstream_timeout_ms: u64,

    /// Maximum concurrent client sessions (0 = unbounded)
    #[arg(short, long, default_value_t = 0)]
    pub max_connections: usize,

    /// Client read timeout in milliseconds (0 = none)
    #[arg(long, default_value_t = 0)]
    pub read_timeout_ms: u64,

    /// Client write timeout in milliseconds (0 = none)
    #[arg(long, default_value_t = 5000)]
    pub write_timeout_ms: u64,

    /// Let concurrent misses on the same key each fetch upstream
    #[arg(long)]
    pub no_dedup: bool,
}

impl ServerArgs {
    /// Build a config from parsed arguments
    pub fn to_config(&self) -> Config {
        Config::builder()
            .host(&self.host)
            .port(self.port)
            .database_path(&self.database)
            .status_path(&self.status_file)
            .upstream_url(&self.upstream_url)
            .base_currency(&self.base_currency)
            .upstream_timeout_ms(self.upstream_timeout_ms)
            .max_connections(self.max_connections)
            .read_timeout_ms(self.read_timeout_ms)
            .write_timeout_ms(self.write_timeout_ms)
            .dedup_fetches(!self.no_dedup)
            .build()
    }

    /// Render a config back into flags for launching the server binary
    pub fn to_argv(config: &Config) -> Vec<String> {
        let mut argv = vec![
            "--host".to_string(),
            config.host.clone(),
            "--port".to_string(),
            config.port.to_string(),
            "--database".to_string(),
            config.database_path.display().to_string(),
            "--status-file".to_string(),
            config.status_path.display().to_string(),
            "--upstream-url".to_string(),
            config.upstream_url.clone(),
            "--base-currency".to_string(),
            config.base_currency.clone(),
            "--upstream-timeout-ms".to_string(),
            config.upstream_timeout_ms.to_string(),
            "--max-connections".to_string(),
            config.max_connections.to_string(),
            "--read-timeout-ms".to_string(),
            config.read_timeout_ms.to_string(),
            "--write-timeout-ms".to_string(),
            config.write_timeout_ms.to_string(),
        ];
        if !config.dedup_fetches {
            argv.push("--no-dedup".to_string());
        }
        argv
    }
}
