//! # RateCache
//!
//! A concurrent exchange-rate cache server with:
//! - A line-based TCP protocol (`GET YYYY-MM-DD CCC`, `count`, `exit`)
//! - Cache-aside lookups against a durable SQLite cache
//! - Upstream fetches on a miss, written back to the cache
//! - Thread-per-session concurrency with a shared live-connection counter
//! - An operator control shell running the server as a separate process
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────┐   start/stop (process)   ┌──────────────────────────┐
//! │  Control Shell   │ ───────────────────────▶ │      TCP Acceptor        │
//! │ (ratecache-ctl)  │ ◀─── status file ─────── │   (one thread/session)   │
//! └────────┬─────────┘                          └────────────┬─────────────┘
//!          │ clear                                           │
//!          │                                    ┌────────────▼─────────────┐
//!          │                                    │  Session → Codec → Engine │
//!          │                                    └──────┬─────────────┬─────┘
//!          │                                           │ miss        │
//!          ▼                                           ▼             ▼
//!   ┌─────────────┐                            ┌─────────────┐ ┌──────────┐
//!   │ Rate Store  │ ◀───────── insert ──────── │  Upstream   │ │  Counter │
//!   │  (SQLite)   │                            │   (HTTP)    │ │ (Mutex)  │
//!   └─────────────┘                            └─────────────┘ └──────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod args;

pub mod store;
pub mod upstream;
pub mod protocol;
pub mod engine;
pub mod network;
pub mod status;
pub mod control;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RateError, Result};
pub use config::Config;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of RateCache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
