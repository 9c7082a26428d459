//! Control Shell
//!
//! Line-oriented operator shell managing one server process.

use std::io::{BufRead, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::status::StatusFile;
use crate::store::RateStore;

use super::{ControlCommand, Launcher, ServerHandle};

type ServerSlot = Arc<Mutex<Option<Box<dyn ServerHandle>>>>;

/// Operator shell: start/stop/status/count/clear/exit
pub struct ControlShell {
    config: Config,
    launcher: Box<dyn Launcher>,

    /// Handle to the server this shell started, if any
    server: ServerSlot,
}

impl ControlShell {
    pub fn new(config: Config, launcher: Box<dyn Launcher>) -> Self {
        Self {
            config,
            launcher,
            server: Arc::new(Mutex::new(None)),
        }
    }

    /// Run one command and return the report line
    pub fn execute(&mut self, command: ControlCommand) -> String {
        match command {
            ControlCommand::Start => self.start(),
            ControlCommand::Stop => self.stop(),
            ControlCommand::Status => self.status(),
            ControlCommand::Count => self.count(),
            ControlCommand::Clear => self.clear(),
            ControlCommand::Exit => {
                self.interrupt_handle().force_stop();
                String::new()
            }
            ControlCommand::Invalid => "Invalid Command".to_string(),
        }
    }

    /// Prompt, read and execute commands until `exit` or end of input
    ///
    /// A running server is force-stopped before returning.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> Result<()> {
        let mut line = String::new();

        loop {
            write!(output, "> ")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            let command: ControlCommand = line.parse().unwrap_or(ControlCommand::Invalid);
            if command == ControlCommand::Exit {
                break;
            }

            writeln!(output, "{}", self.execute(command))?;
        }

        self.interrupt_handle().force_stop();
        Ok(())
    }

    /// A handle that can kill the server from a signal handler
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            server: Arc::clone(&self.server),
        }
    }

    fn start(&mut self) -> String {
        let mut server = self.server.lock();
        if server.as_mut().map_or(false, |s| s.is_alive()) {
            return "server is already running".to_string();
        }

        match self.launcher.launch(&self.config) {
            Ok(handle) => {
                *server = Some(handle);
                "server started".to_string()
            }
            Err(e) => {
                tracing::error!("Failed to start server: {}", e);
                format!("failed to start server: {}", e)
            }
        }
    }

    fn stop(&mut self) -> String {
        let mut server = self.server.lock();
        let Some(mut handle) = server.take() else {
            return "server is not running".to_string();
        };
        if !handle.is_alive() {
            return "server is not running".to_string();
        }

        if let Err(e) = handle.terminate() {
            tracing::error!("Failed to stop server: {}", e);
            *server = Some(handle);
            return format!("failed to stop server: {}", e);
        }
        if let Err(e) = StatusFile::remove(&self.config.status_path) {
            tracing::warn!("Failed to remove stale status file: {}", e);
        }
        "server stopped".to_string()
    }

    fn status(&mut self) -> String {
        if self.is_running() {
            "server is running".to_string()
        } else {
            "server is not running".to_string()
        }
    }

    fn count(&mut self) -> String {
        let pid = {
            let mut server = self.server.lock();
            match server.as_mut() {
                Some(handle) => {
                    if !handle.is_alive() {
                        return "server is not running".to_string();
                    }
                    handle.pid()
                }
                None => return "server is not running".to_string(),
            }
        };

        match StatusFile::read(&self.config.status_path) {
            // Status left behind by some other process does not count
            Ok(Some(status)) if pid.map_or(true, |pid| pid == status.pid) => {
                format!("{} connected clients", status.live_connections)
            }
            Ok(_) => "0 connected clients".to_string(),
            Err(e) => {
                tracing::error!("Failed to read server status: {}", e);
                format!("failed to read server status: {}", e)
            }
        }
    }

    fn clear(&mut self) -> String {
        let removed = RateStore::open(&self.config.database_path).and_then(|store| store.clear());
        match removed {
            Ok(n) => format!("cleared {} cached rates", n),
            Err(e) => {
                tracing::error!("Failed to clear cache: {}", e);
                format!("failed to clear cache: {}", e)
            }
        }
    }

    fn is_running(&self) -> bool {
        self.server.lock().as_mut().map_or(false, |s| s.is_alive())
    }
}

/// Kills the shell's server from outside the command loop
#[derive(Clone)]
pub struct InterruptHandle {
    server: ServerSlot,
}

impl InterruptHandle {
    /// Terminate the server if one is running
    pub fn force_stop(&self) {
        if let Some(mut handle) = self.server.lock().take() {
            if handle.is_alive() {
                match handle.terminate() {
                    Ok(()) => tracing::info!("Server terminated"),
                    Err(e) => tracing::error!("Failed to terminate server: {}", e),
                }
            }
        }
    }
}
