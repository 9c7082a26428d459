//! Connection Handler
//!
//! Runs one client session: greeting, serving loop, closing.

use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::engine::Engine;
use crate::error::{RateError, Result};
use crate::protocol::{decode_request, encode_response, split_lines, Request, Response, MAX_READ_SIZE};

use super::ConnectionGuard;

/// What the serving loop does after a command
enum Flow {
    Continue,
    Close,
}

/// Handles a single client connection
pub struct Connection {
    /// Exclusively owned client stream
    stream: TcpStream,

    /// Shared cache-aside resolver
    engine: Arc<Engine>,

    /// Registration in the live counter, released when the session drops
    guard: ConnectionGuard,

    /// Read buffer, reused across reads
    buffer: BytesMut,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, engine: Arc<Engine>, guard: ConnectionGuard) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            engine,
            guard,
            buffer: BytesMut::with_capacity(MAX_READ_SIZE),
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 leaves the timeout unset)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Run the session until the client leaves (blocking)
    ///
    /// Request failures become response lines; only stream errors end the
    /// session early.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Session started for {}", self.peer_addr);

        if let Err(e) = self.send(&Response::Greeting) {
            return self.finish(e);
        }

        loop {
            let chunk = match self.read_chunk() {
                Ok(chunk) => chunk,
                Err(e) => return self.finish(e),
            };

            for line in split_lines(&chunk) {
                let flow = match self.serve_line(&line) {
                    Ok(flow) => flow,
                    Err(e) => return self.finish(e),
                };
                if let Flow::Close = flow {
                    tracing::debug!("Client {} ended the session", self.peer_addr);
                    return Ok(());
                }
            }
        }
    }

    /// Decode, execute and answer one command line
    fn serve_line(&mut self, line: &str) -> Result<Flow> {
        tracing::info!("{} sent {:?}", self.peer_addr, line);

        let response = match decode_request(line) {
            Ok(Request::Exit) => return Ok(Flow::Close),
            Ok(Request::Count) => Response::ClientCount(self.guard.counter().current()),
            Ok(Request::Get { date, currency }) => {
                match self.engine.get_or_fetch(&date, &currency) {
                    Ok(rate) => Response::rate(currency.as_str(), rate),
                    Err(e) => {
                        tracing::error!(
                            "Lookup of {} {} for {} failed: {}",
                            date, currency, self.peer_addr, e
                        );
                        Response::from_error(&e)
                    }
                }
            }
            Err(e) => {
                tracing::debug!("Rejected command from {}: {}", self.peer_addr, e);
                Response::from_error(&e)
            }
        };

        self.send(&response)?;
        Ok(Flow::Continue)
    }

    /// One read from the socket; an empty chunk means the peer closed
    fn read_chunk(&mut self) -> Result<Bytes> {
        self.buffer.clear();
        self.buffer.resize(MAX_READ_SIZE, 0);
        let n = self.stream.read(&mut self.buffer[..])?;
        self.buffer.truncate(n);
        Ok(self.buffer.split().freeze())
    }

    /// Send a response to the client
    fn send(&mut self, response: &Response) -> Result<()> {
        self.stream.write_all(&encode_response(response))?;
        self.stream.flush()?;
        Ok(())
    }

    /// Treat disconnects and timeouts as a normal end of session
    fn finish(&self, err: RateError) -> Result<()> {
        if let RateError::Io(ref io_err) = err {
            match io_err.kind() {
                ErrorKind::ConnectionAborted
                | ErrorKind::ConnectionReset
                | ErrorKind::BrokenPipe
                | ErrorKind::UnexpectedEof => {
                    tracing::debug!("Client {} disconnected: {}", self.peer_addr, io_err);
                    return Ok(());
                }
                // Windows reports read timeouts as TimedOut instead of WouldBlock
                ErrorKind::WouldBlock | ErrorKind::TimedOut => {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                _ => {}
            }
        }
        tracing::warn!("Session with {} failed: {}", self.peer_addr, err);
        Err(err)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        tracing::debug!("Session closed for {}", self.peer_addr);
    }
}
