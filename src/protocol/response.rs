//! Response definitions
//!
//! Represents responses to clients. There is no status envelope: every
//! response is a single human-readable ASCII line.

use crate::error::RateError;

/// Sent once when a session starts
pub const GREETING: &str = "Connected to the Rates Server";

/// A response to send to a client
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Welcome payload sent on accept
    Greeting,

    /// A resolved rate, `<CURRENCY>: <RATE>`
    Rate { currency: String, rate: f64 },

    /// Live session count, `<n> connected clients`
    ClientCount(usize),

    /// Input did not match the grammar
    InvalidCommand,

    /// Input matched the grammar but the verb is unknown
    InvalidCommandName,

    /// Upstream or storage failure
    UnknownError,
}

impl Response {
    /// Create a rate response
    pub fn rate(currency: impl Into<String>, rate: f64) -> Self {
        Response::Rate {
            currency: currency.into(),
            rate,
        }
    }

    /// Map a request failure to the fixed line the client sees
    pub fn from_error(err: &RateError) -> Self {
        match err {
            RateError::InvalidCommandSyntax(_) => Response::InvalidCommand,
            RateError::InvalidCommandName(_) => Response::InvalidCommandName,
            _ => Response::UnknownError,
        }
    }

    /// Render the response as it goes on the wire
    pub fn encode(&self) -> String {
        match self {
            Response::Greeting => GREETING.to_string(),
            Response::Rate { currency, rate } => format!("{}: {}", currency, format_rate(*rate)),
            Response::ClientCount(n) => format!("{} connected clients", n),
            Response::InvalidCommand => "Invalid Command".to_string(),
            Response::InvalidCommandName => "Invalid Command Name".to_string(),
            Response::UnknownError => "Unknown Error".to_string(),
        }
    }
}

/// Shortest round-trip form, keeping a `.0` on whole numbers
fn format_rate(rate: f64) -> String {
    if rate.is_finite() && rate.fract() == 0.0 {
        format!("{:.1}", rate)
    } else {
        rate.to_string()
    }
}
