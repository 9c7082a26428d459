//! Tests for the status channel
//!
//! These tests verify:
//! - Snapshot framing and corruption detection
//! - Status file read/write/remove semantics
//! - The publisher tracking live session counts and cleaning up on stop

use std::sync::Arc;
use std::time::Duration;

use ratecache::network::ConnectionCounter;
use ratecache::status::{ServerStatus, StatusFile, StatusPublisher, HEADER_SIZE, MAGIC};
use ratecache::RateError;
use tempfile::TempDir;

#[path = "../common/mod.rs"]
mod common;

use common::wait_until;

fn read_live(path: &std::path::Path) -> Option<u64> {
    StatusFile::read(path)
        .ok()
        .flatten()
        .map(|status| status.live_connections)
}

// =============================================================================
// Snapshot Framing
// =============================================================================

#[test]
fn test_snapshot_encode_decode() {
    let mut status = ServerStatus::new("127.0.0.1:5050");
    status.touch(3);

    let bytes = status.encode().unwrap();
    assert_eq!(&bytes[..4], MAGIC);
    assert!(bytes.len() > HEADER_SIZE);

    let decoded = ServerStatus::decode(&bytes).unwrap();
    assert_eq!(decoded, status);
    assert_eq!(decoded.pid, std::process::id());
    assert_eq!(decoded.live_connections, 3);
}

#[test]
fn test_snapshot_rejects_bad_magic() {
    let mut bytes = ServerStatus::new("127.0.0.1:5050").encode().unwrap();
    bytes[0] = b'X';

    assert!(matches!(
        ServerStatus::decode(&bytes),
        Err(RateError::StatusCorrupted(_))
    ));
}

#[test]
fn test_snapshot_rejects_flipped_payload() {
    let mut bytes = ServerStatus::new("127.0.0.1:5050").encode().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;

    assert!(matches!(
        ServerStatus::decode(&bytes),
        Err(RateError::StatusCorrupted(_))
    ));
}

#[test]
fn test_snapshot_rejects_truncation() {
    let bytes = ServerStatus::new("127.0.0.1:5050").encode().unwrap();

    assert!(matches!(
        ServerStatus::decode(&bytes[..bytes.len() - 2]),
        Err(RateError::StatusCorrupted(_))
    ));
    assert!(matches!(
        ServerStatus::decode(&bytes[..HEADER_SIZE - 1]),
        Err(RateError::StatusCorrupted(_))
    ));
}

// =============================================================================
// Status File
// =============================================================================

#[test]
fn test_status_file_missing_is_none() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("server.status");

    assert!(StatusFile::read(&path).unwrap().is_none());
    // Removing a missing file is not an error
    StatusFile::remove(&path).unwrap();
}

#[test]
fn test_status_file_write_read_remove() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("server.status");

    let mut status = ServerStatus::new("127.0.0.1:6000");
    status.touch(7);
    StatusFile::write(&path, &status).unwrap();

    assert_eq!(StatusFile::read(&path).unwrap(), Some(status));

    StatusFile::remove(&path).unwrap();
    assert!(!path.exists());
}

#[test]
fn test_status_file_corruption_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("server.status");
    std::fs::write(&path, b"not a status file").unwrap();

    assert!(matches!(
        StatusFile::read(&path),
        Err(RateError::StatusCorrupted(_))
    ));
}

// =============================================================================
// Publisher
// =============================================================================

#[test]
fn test_publisher_writes_initial_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("server.status");

    let publisher = StatusPublisher::start(
        path.clone(),
        "127.0.0.1:5050".to_string(),
        Duration::from_millis(50),
    )
    .unwrap();

    let status = StatusFile::read(&path).unwrap().unwrap();
    assert_eq!(status.listen_addr, "127.0.0.1:5050");
    assert_eq!(status.live_connections, 0);
    assert_eq!(publisher.path(), &path);

    publisher.stop();
}

#[test]
fn test_publisher_tracks_counter() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("server.status");

    let publisher = StatusPublisher::start(
        path.clone(),
        "127.0.0.1:5050".to_string(),
        Duration::from_millis(50),
    )
    .unwrap();
    let counter = Arc::new(ConnectionCounter::with_notifier(publisher.notifier()));

    let first = ConnectionCounter::register(&counter);
    let second = ConnectionCounter::register(&counter);
    let third = ConnectionCounter::register(&counter);
    assert!(wait_until(|| read_live(&path) == Some(3)));

    drop(second);
    assert!(wait_until(|| read_live(&path) == Some(2)));

    drop(first);
    drop(third);
    assert!(wait_until(|| read_live(&path) == Some(0)));

    publisher.stop();
}

#[test]
fn test_publisher_removes_file_on_stop() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("server.status");

    let publisher = StatusPublisher::start(
        path.clone(),
        "127.0.0.1:5050".to_string(),
        Duration::from_millis(50),
    )
    .unwrap();
    assert!(path.exists());

    publisher.stop();
    assert!(!path.exists());
}

#[test]
fn test_notifier_outliving_publisher_is_harmless() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("server.status");

    let publisher = StatusPublisher::start(
        path.clone(),
        "127.0.0.1:5050".to_string(),
        Duration::from_millis(50),
    )
    .unwrap();
    let notifier = publisher.notifier();
    drop(publisher);

    notifier.connections_changed(4);
    assert!(!path.exists());
}
