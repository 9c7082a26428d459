//! Status publisher
//!
//! Background thread that keeps the status file current.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{select, tick, unbounded, Receiver, Sender};

use crate::error::Result;

use super::{ServerStatus, StatusFile};

enum StatusEvent {
    /// Live session count changed
    Connections(usize),

    /// Stop publishing and remove the file
    Shutdown,
}

/// Cheap handle sessions use to report count changes
#[derive(Clone)]
pub struct StatusNotifier {
    tx: Sender<StatusEvent>,
}

impl StatusNotifier {
    /// Report the new live session count
    pub fn connections_changed(&self, live: usize) {
        // Publisher gone means the server is stopping; nothing to report to
        let _ = self.tx.send(StatusEvent::Connections(live));
    }
}

/// Owns the publishing thread
///
/// Rewrites the file on every count change and on each tick, and removes it
/// on `stop`.
pub struct StatusPublisher {
    tx: Sender<StatusEvent>,
    handle: Option<JoinHandle<()>>,
    path: PathBuf,
}

impl StatusPublisher {
    /// Write the initial snapshot and start the publishing thread
    pub fn start(path: PathBuf, listen_addr: String, interval: Duration) -> Result<Self> {
        let status = ServerStatus::new(listen_addr);
        StatusFile::write(&path, &status)?;

        let (tx, rx) = unbounded();
        let thread_path = path.clone();
        let handle = thread::Builder::new()
            .name("status-publisher".to_string())
            .spawn(move || publish_loop(thread_path, status, rx, interval))?;

        tracing::debug!("Status publisher writing to {}", path.display());

        Ok(Self {
            tx,
            handle: Some(handle),
            path,
        })
    }

    /// A handle for reporting count changes
    pub fn notifier(&self) -> StatusNotifier {
        StatusNotifier {
            tx: self.tx.clone(),
        }
    }

    /// Get the status file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Stop publishing and remove the status file
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.tx.send(StatusEvent::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Status publisher thread panicked");
            }
        }
    }
}

impl Drop for StatusPublisher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn publish_loop(
    path: PathBuf,
    mut status: ServerStatus,
    rx: Receiver<StatusEvent>,
    interval: Duration,
) {
    let ticker = tick(interval.max(Duration::from_millis(10)));

    loop {
        select! {
            recv(rx) -> event => match event {
                Ok(StatusEvent::Connections(live)) => status.touch(live as u64),
                Ok(StatusEvent::Shutdown) | Err(_) => break,
            },
            recv(ticker) -> _ => status.touch(status.live_connections),
        }

        if let Err(e) = StatusFile::write(&path, &status) {
            tracing::warn!("Failed to publish status to {}: {}", path.display(), e);
        }
    }

    if let Err(e) = StatusFile::remove(&path) {
        tracing::warn!("Failed to remove status file {}: {}", path.display(), e);
    }
}
