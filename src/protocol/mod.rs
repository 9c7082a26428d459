//! Protocol Module
//!
//! Defines the text protocol spoken between clients and the server.
//!
//! ## Protocol Format
//!
//! ### Requests
//! - `GET YYYY-MM-DD CCC` - look up a rate
//! - `count`              - number of connected clients
//! - `exit` or empty      - close the session
//!
//! ### Responses
//! - `CCC: <rate>`
//! - `<n> connected clients`
//! - `Invalid Command` / `Invalid Command Name` / `Unknown Error`

mod command;
mod response;
mod codec;

pub use command::{CurrencySymbol, MarketDate, Request};
pub use response::{Response, GREETING};
pub use codec::{decode_request, encode_response, split_lines, MAX_READ_SIZE};
