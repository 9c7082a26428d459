//! Network Module
//!
//! TCP acceptor and per-client sessions.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One thread per session, optionally bounded by `max_connections`
//! - Sessions resolve rates through the shared Engine

mod server;
mod connection;
mod counter;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
pub use counter::{ConnectionCounter, ConnectionGuard};
