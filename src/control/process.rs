//! Server process handles
//!
//! The control shell runs the server as a separate OS process and only
//! holds an opaque handle to it.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::args::ServerArgs;
use crate::config::Config;
use crate::error::Result;

/// Name of the server binary, installed next to the shell
pub const SERVER_BINARY: &str = "ratecache-server";

/// A running (or exited) server owned by the shell
pub trait ServerHandle: Send {
    /// Whether the server is still running
    fn is_alive(&mut self) -> bool;

    /// Forcibly end the server; no graceful drain
    fn terminate(&mut self) -> Result<()>;

    /// OS process id, when there is one
    fn pid(&self) -> Option<u32>;
}

/// Starts servers for the shell
pub trait Launcher: Send {
    fn launch(&self, config: &Config) -> Result<Box<dyn ServerHandle>>;
}

/// Launches the server binary as a child process
pub struct ProcessLauncher {
    program: PathBuf,
}

impl ProcessLauncher {
    /// Launch `program` with the config rendered as flags
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Launch the server binary sitting next to the current executable
    pub fn sibling() -> Result<Self> {
        let exe = std::env::current_exe()?;
        let name = format!("{}{}", SERVER_BINARY, std::env::consts::EXE_SUFFIX);
        Ok(Self::new(exe.with_file_name(name)))
    }

    /// Get the program path
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&self, config: &Config) -> Result<Box<dyn ServerHandle>> {
        let child = Command::new(&self.program)
            .args(ServerArgs::to_argv(config))
            .stdin(Stdio::null())
            .spawn()?;

        tracing::info!("Launched {} as pid {}", self.program.display(), child.id());
        Ok(Box::new(ChildHandle { child }))
    }
}

/// Handle to a server child process
pub struct ChildHandle {
    child: Child,
}

impl ServerHandle for ChildHandle {
    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn terminate(&mut self) -> Result<()> {
        if self.is_alive() {
            self.child.kill()?;
        }
        // Reap so no zombie is left behind
        self.child.wait()?;
        Ok(())
    }

    fn pid(&self) -> Option<u32> {
        Some(self.child.id())
    }
}
