//! Control Module
//!
//! Operator-facing lifecycle management for a server process.
//!
//! ## Commands
//! - `start`  - launch the server unless one is running
//! - `stop`   - force-terminate the running server
//! - `status` - running / not running
//! - `count`  - live sessions, read from the server's status file
//! - `clear`  - empty the rate cache (server need not be running)
//! - `exit`   - stop any running server and leave

mod command;
mod process;
mod shell;

pub use command::ControlCommand;
pub use process::{ChildHandle, Launcher, ProcessLauncher, ServerHandle, SERVER_BINARY};
pub use shell::{ControlShell, InterruptHandle};
