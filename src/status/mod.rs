//! Status Module
//!
//! Inter-process status channel between a running server and the control
//! shell. The server publishes a small snapshot file; the shell reads it for
//! `count` without touching server memory.
//!
//! ## File Format
//! ```text
//! ┌───────────┬──────────┬──────────┬──────────────────────┐
//! │ Magic (4) │ CRC (4)  │ Len (4)  │ bincode(ServerStatus) │
//! └───────────┴──────────┴──────────┴──────────────────────┘
//! ```
//! The file is replaced atomically (write temp, rename), so a reader never
//! sees a half-written snapshot.

mod snapshot;
mod publisher;

pub use snapshot::{ServerStatus, StatusFile, HEADER_SIZE, MAGIC};
pub use publisher::{StatusNotifier, StatusPublisher};
