//! RateCache Server Binary
//!
//! Runs the TCP acceptor in the foreground until stopped.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ratecache::args::ServerArgs;
use ratecache::network::Server;
use ratecache::status::StatusPublisher;
use ratecache::store::RateStore;
use ratecache::upstream::HttpRateSource;
use ratecache::{Config, Engine, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// RateCache Server
#[derive(Parser, Debug)]
#[command(name = "ratecache-server")]
#[command(about = "Exchange-rate cache server")]
#[command(version)]
struct Args {
    #[command(flatten)]
    server: ServerArgs,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ratecache=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    let config = args.server.to_config();

    tracing::info!("RateCache Server v{}", ratecache::VERSION);
    tracing::info!("Database: {}", config.database_path.display());
    tracing::info!("Listen address: {}", config.listen_addr());
    tracing::info!("Upstream: {} (base {})", config.upstream_url, config.base_currency);

    if let Err(e) = serve(config) {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

fn serve(config: Config) -> Result<()> {
    config.validate()?;

    let store = Arc::new(RateStore::open(&config.database_path)?);
    let source = Arc::new(HttpRateSource::new(&config)?);
    let engine = Arc::new(Engine::new(store, source, &config));

    // Bind before publishing status so a bind failure leaves no status file
    let server = Server::bind(config.clone(), engine)?;

    let publisher = StatusPublisher::start(
        config.status_path.clone(),
        server.local_addr().to_string(),
        Duration::from_millis(config.status_interval_ms),
    )?;
    let server = server.with_status(publisher.notifier());

    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, shutting down...");
        shutdown.shutdown();
    }) {
        tracing::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    let result = server.run();
    publisher.stop();
    result
}
