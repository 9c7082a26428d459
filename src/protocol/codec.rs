//! Protocol codec
//!
//! Decoding functions for the line-based wire protocol.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! GET <YYYY-MM-DD> <CCC>
//! count
//! exit
//! ```
//!
//! Tokens are separated by exactly one space and matched case-sensitively.
//! `count` and `exit` are checked verbatim before the grammar is tried.
//!
//! ### Framing
//! One read normally carries one command with no terminator. When a read
//! carries several newline-separated commands each non-empty line is decoded
//! in order. Only a zero-byte read is the empty command that ends a session;
//! whitespace is malformed input like any other.

use crate::error::{RateError, Result};
use super::{Request, Response};

/// The only verb the grammar accepts
pub const GET_VERB: &str = "GET";

/// Reserved token reporting the live session count
pub const COUNT_TOKEN: &str = "count";

/// Reserved token ending the session
pub const EXIT_TOKEN: &str = "exit";

/// Largest single read the server processes
pub const MAX_READ_SIZE: usize = 2048;

// =============================================================================
// Request Decoding
// =============================================================================

/// Decode one command line into a request
///
/// - `InvalidCommandSyntax` when the line does not match `VERB DATE SYMBOL`
/// - `InvalidCommandName` when it does but the verb is not `GET`
pub fn decode_request(line: &str) -> Result<Request> {
    if line.is_empty() || line == EXIT_TOKEN {
        return Ok(Request::Exit);
    }
    if line == COUNT_TOKEN {
        return Ok(Request::Count);
    }

    let mut parts = line.split(' ');
    let (verb, date, currency) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(verb), Some(date), Some(currency), None) => (verb, date, currency),
        _ => return Err(RateError::InvalidCommandSyntax(line.to_string())),
    };

    if verb.is_empty() || !verb.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(RateError::InvalidCommandSyntax(line.to_string()));
    }

    let request = Request::get(date, currency)
        .map_err(|_| RateError::InvalidCommandSyntax(line.to_string()))?;

    if verb != GET_VERB {
        return Err(RateError::InvalidCommandName(verb.to_string()));
    }

    Ok(request)
}

/// Split one read from the socket into command lines
///
/// A zero-byte read yields a single empty line, which decodes to `Exit`.
/// A read with no non-empty line is passed through whole so it is answered
/// as malformed rather than closing the session.
pub fn split_lines(chunk: &[u8]) -> Vec<String> {
    if chunk.is_empty() {
        return vec![String::new()];
    }

    let text = String::from_utf8_lossy(chunk);
    let lines: Vec<String> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if lines.is_empty() {
        vec![text.into_owned()]
    } else {
        lines
    }
}

// =============================================================================
// Response Encoding
// =============================================================================

/// Encode a response to bytes
pub fn encode_response(response: &Response) -> Vec<u8> {
    response.encode().into_bytes()
}
