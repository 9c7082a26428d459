//! TCP Server
//!
//! Accepts connections and runs each session on its own thread.

use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{RateError, Result};
use crate::protocol::{encode_response, Response};
use crate::status::StatusNotifier;

use super::{Connection, ConnectionCounter};

/// TCP server for RateCache
pub struct Server {
    config: Config,

    /// Bound listening socket
    listener: TcpListener,

    /// Actual bound address (resolves port 0)
    local_addr: SocketAddr,

    /// Shared cache-aside resolver
    engine: Arc<Engine>,

    /// Live session counter shared by all sessions
    counter: Arc<ConnectionCounter>,

    /// Set to stop the accept loop
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Bind the listening socket
    ///
    /// A bind failure is fatal: the server never starts accepting.
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        let addr = config.listen_addr();
        let listener = TcpListener::bind(&addr).map_err(|source| RateError::Bind {
            addr: addr.clone(),
            source,
        })?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Listening on {}", local_addr);

        Ok(Self {
            config,
            listener,
            local_addr,
            engine,
            counter: Arc::new(ConnectionCounter::new()),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Publish live count changes through `notifier`
    ///
    /// Must be called before `run`.
    pub fn with_status(mut self, notifier: StatusNotifier) -> Self {
        self.counter = Arc::new(ConnectionCounter::with_notifier(notifier));
        self
    }

    /// Accept connections until shut down (blocking)
    pub fn run(&self) -> Result<()> {
        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            match stream {
                Ok(stream) => self.dispatch(stream),
                Err(e) => tracing::warn!("Failed to accept connection: {}", e),
            }
        }

        tracing::info!("Acceptor on {} stopped", self.local_addr);
        Ok(())
    }

    /// Count the connection and hand it to a fresh session thread
    fn dispatch(&self, mut stream: TcpStream) {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let guard = match ConnectionCounter::try_register(&self.counter, self.config.max_connections) {
            Some(guard) => guard,
            None => {
                tracing::warn!(
                    "Refusing {}: {} sessions already open",
                    peer,
                    self.config.max_connections
                );
                if let Err(e) = stream.write_all(&encode_response(&Response::UnknownError)) {
                    tracing::debug!("Could not notify refused client {}: {}", peer, e);
                }
                return;
            }
        };

        tracing::info!("Client {} connected", peer);

        let engine = Arc::clone(&self.engine);
        let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

        let spawned = thread::Builder::new()
            .name(format!("session-{}", peer))
            .spawn(move || {
                let mut connection = match Connection::new(stream, engine, guard) {
                    Ok(connection) => connection,
                    Err(e) => {
                        tracing::error!("Failed to set up session: {}", e);
                        return;
                    }
                };
                if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
                    tracing::error!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
                    return;
                }
                if let Err(e) = connection.handle() {
                    tracing::error!("Session with {} ended with error: {}", connection.peer_addr(), e);
                }
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn session thread for {}: {}", peer, e);
        }
    }

    /// A handle that can stop the accept loop from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            addr: self.local_addr,
        }
    }

    /// Get the bound address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get the live session counter
    pub fn counter(&self) -> &Arc<ConnectionCounter> {
        &self.counter
    }
}

/// Stops a running acceptor
///
/// Sessions already running are not drained; they end with their client or
/// with the process.
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    /// Signal the server to stop accepting
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // Wake the blocking accept so the flag is observed
        let _ = TcpStream::connect(self.addr);
    }
}
