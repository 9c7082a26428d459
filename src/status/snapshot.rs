//! Status snapshot
//!
//! Encoding and atomic file I/O for `ServerStatus`.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{RateError, Result};

/// File magic: "RCST"
pub const MAGIC: &[u8; 4] = b"RCST";

/// Header size: magic (4) + crc (4) + payload_len (4)
pub const HEADER_SIZE: usize = 12;

/// What a running server reports about itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    /// OS process id of the server
    pub pid: u32,

    /// Address the acceptor is bound to
    pub listen_addr: String,

    /// Sessions currently open
    pub live_connections: u64,

    /// Unix millis when the server started
    pub started_at_ms: u64,

    /// Unix millis of this snapshot
    pub updated_at_ms: u64,
}

impl ServerStatus {
    /// Snapshot for a server that just started
    pub fn new(listen_addr: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            pid: std::process::id(),
            listen_addr: listen_addr.into(),
            live_connections: 0,
            started_at_ms: now,
            updated_at_ms: now,
        }
    }

    /// Serialize into the framed on-disk form
    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)?;
        let crc = crc32fast::hash(&payload);

        let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Parse the framed on-disk form, verifying magic, length and checksum
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(RateError::StatusCorrupted(format!(
                "expected at least {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }
        if &bytes[0..4] != MAGIC {
            return Err(RateError::StatusCorrupted("bad magic".to_string()));
        }

        let crc = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;

        let payload = &bytes[HEADER_SIZE..];
        if payload.len() != len {
            return Err(RateError::StatusCorrupted(format!(
                "payload length {} does not match header {}",
                payload.len(),
                len
            )));
        }
        if crc32fast::hash(payload) != crc {
            return Err(RateError::StatusCorrupted("checksum mismatch".to_string()));
        }

        Ok(bincode::deserialize(payload)?)
    }

    /// Update the live count and timestamp
    pub fn touch(&mut self, live_connections: u64) {
        self.live_connections = live_connections;
        self.updated_at_ms = now_millis();
    }
}

/// Reads and writes the status file
pub struct StatusFile;

impl StatusFile {
    /// Replace the status file with `status`
    pub fn write(path: &Path, status: &ServerStatus) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, status.encode()?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Read the status file; `None` when no server has published one
    pub fn read(path: &Path) -> Result<Option<ServerStatus>> {
        match fs::read(path) {
            Ok(bytes) => ServerStatus::decode(&bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the status file if present
    pub fn remove(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
