//! Request definitions
//!
//! Represents commands from clients.

use std::fmt;
use std::str::FromStr;

use crate::error::RateError;

/// A calendar date in `YYYY-MM-DD` shape
///
/// Only the shape is checked: `2024-13-01` is accepted and passed through
/// to the store unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarketDate(String);

impl MarketDate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MarketDate {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let shaped = bytes.len() == 10
            && bytes.iter().enumerate().all(|(i, b)| match i {
                4 | 7 => *b == b'-',
                _ => b.is_ascii_digit(),
            });

        if shaped {
            Ok(Self(s.to_string()))
        } else {
            Err(RateError::InvalidCommandSyntax(format!("bad market date {:?}", s)))
        }
    }
}

impl fmt::Display for MarketDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A three-letter uppercase currency code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencySymbol(String);

impl CurrencySymbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencySymbol {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() == 3 && bytes.iter().all(u8::is_ascii_uppercase) {
            Ok(Self(s.to_string()))
        } else {
            Err(RateError::InvalidCommandSyntax(format!("bad currency symbol {:?}", s)))
        }
    }
}

impl fmt::Display for CurrencySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parsed client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Look up the rate of `currency` on `date`
    Get {
        date: MarketDate,
        currency: CurrencySymbol,
    },

    /// Report the number of live sessions
    Count,

    /// End the session
    Exit,
}

impl Request {
    /// Build a GET request from raw parts, validating both
    pub fn get(date: &str, currency: &str) -> Result<Self, RateError> {
        Ok(Request::Get {
            date: date.parse()?,
            currency: currency.parse()?,
        })
    }
}

/// Renders the request in its wire form
impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Get { date, currency } => write!(f, "GET {} {}", date, currency),
            Request::Count => f.write_str("count"),
            Request::Exit => f.write_str("exit"),
        }
    }
}
