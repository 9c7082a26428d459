//! Control commands
//!
//! The operator shell's fixed vocabulary.

use std::str::FromStr;

/// A command typed at the control shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Stop,
    Status,
    Count,
    Clear,
    Exit,

    /// Anything else; reported and ignored
    Invalid,
}

impl FromStr for ControlCommand {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "start" => ControlCommand::Start,
            "stop" => ControlCommand::Stop,
            "status" => ControlCommand::Status,
            "count" => ControlCommand::Count,
            "clear" => ControlCommand::Clear,
            "exit" => ControlCommand::Exit,
            _ => ControlCommand::Invalid,
        })
    }
}
