//! Live connection counter
//!
//! The one piece of in-memory state shared by every session.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::status::StatusNotifier;

/// Process-wide count of open sessions
///
/// Increments and decrements happen under one mutex. Reads via `current`
/// may race with in-flight changes.
pub struct ConnectionCounter {
    live: Mutex<usize>,

    /// Where count changes are published for other processes
    notifier: Option<StatusNotifier>,
}

impl ConnectionCounter {
    /// Counter that is only visible in-process
    pub fn new() -> Self {
        Self {
            live: Mutex::new(0),
            notifier: None,
        }
    }

    /// Counter that reports every change to the status publisher
    pub fn with_notifier(notifier: StatusNotifier) -> Self {
        Self {
            live: Mutex::new(0),
            notifier: Some(notifier),
        }
    }

    /// Count a new session; the returned guard uncounts it on drop
    pub fn register(this: &Arc<Self>) -> ConnectionGuard {
        this.adjust(|live| *live += 1);
        ConnectionGuard {
            counter: Arc::clone(this),
        }
    }

    /// Count a new session unless `max` are already open (0 = no limit)
    pub fn try_register(this: &Arc<Self>, max: usize) -> Option<ConnectionGuard> {
        let admitted = this.adjust(|live| {
            if max == 0 || *live < max {
                *live += 1;
                true
            } else {
                false
            }
        });

        admitted.then(|| ConnectionGuard {
            counter: Arc::clone(this),
        })
    }

    /// Current number of open sessions
    pub fn current(&self) -> usize {
        *self.live.lock()
    }

    fn release(&self) {
        self.adjust(|live| *live = live.saturating_sub(1));
    }

    /// Apply `f` under the lock and publish the result before unlocking, so
    /// published values arrive in the order they were produced
    fn adjust<T>(&self, f: impl FnOnce(&mut usize) -> T) -> T {
        let mut live = self.live.lock();
        let before = *live;
        let out = f(&mut live);
        if *live != before {
            if let Some(notifier) = &self.notifier {
                notifier.connections_changed(*live);
            }
        }
        out
    }
}

impl Default for ConnectionCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// One counted session; decrements the counter exactly once when dropped
pub struct ConnectionGuard {
    counter: Arc<ConnectionCounter>,
}

impl ConnectionGuard {
    /// The counter this session is registered with
    pub fn counter(&self) -> &ConnectionCounter {
        &self.counter
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counter.release();
    }
}
