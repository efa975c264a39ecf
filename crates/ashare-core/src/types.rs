//! Core data types for A-share market data.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Symbol`] - Exchange-qualified trading symbol (`000001.SZ`)
//! - [`Exchange`] - Market identifier
//! - [`Bar`] - Immutable OHLCV observation
//! - [`Security`] - Immutable listing metadata

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An exchange-qualified trading symbol such as `000001.SZ`.
///
/// Surrounding whitespace is trimmed on creation. Case is preserved so that
/// suffix comparisons stay exact.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.len() == s.len() {
            Self(s)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Builds `<code>.<suffix>` for a listing on the given exchange.
    #[must_use]
    pub fn from_code(code: &str, exchange: Exchange) -> Self {
        Self::new(format!("{}.{}", code.trim(), exchange.suffix()))
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Market on which a security is listed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Exchange {
    /// Shenzhen Stock Exchange.
    #[serde(rename = "SZSE")]
    Szse,
    /// Shanghai Stock Exchange.
    #[serde(rename = "SSE")]
    Sse,
}

impl Exchange {
    /// Every supported exchange, in listing fetch order.
    pub const ALL: [Self; 2] = [Self::Szse, Self::Sse];

    /// Returns the market identifier (`"SZSE"`, `"SSE"`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Szse => "SZSE",
            Self::Sse => "SSE",
        }
    }

    /// Returns the symbol suffix used for this market (`"SZ"`, `"SH"`).
    #[must_use]
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Szse => "SZ",
            Self::Sse => "SH",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = crate::error::DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SZSE" | "SZ" => Ok(Self::Szse),
            "SSE" | "SH" => Ok(Self::Sse),
            other => Err(crate::error::DataError::Other(format!(
                "unknown exchange: {other}"
            ))),
        }
    }
}

/// One OHLCV observation for one symbol over one time window.
///
/// Fields are only readable; a bar cannot be altered after construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    symbol: Symbol,
    timestamp: NaiveDateTime,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl Bar {
    /// Creates a new bar. `timestamp` marks the start of the window.
    #[must_use]
    pub const fn new(
        symbol: Symbol,
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            symbol,
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Symbol this bar belongs to.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Start of the observation window.
    #[must_use]
    pub const fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Calendar date of the observation window.
    #[must_use]
    pub fn trading_date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Opening price.
    #[must_use]
    pub const fn open(&self) -> f64 {
        self.open
    }

    /// Highest price.
    #[must_use]
    pub const fn high(&self) -> f64 {
        self.high
    }

    /// Lowest price.
    #[must_use]
    pub const fn low(&self) -> f64 {
        self.low
    }

    /// Closing price.
    #[must_use]
    pub const fn close(&self) -> f64 {
        self.close
    }

    /// Traded volume, in the provider's unit (shares or lots).
    #[must_use]
    pub const fn volume(&self) -> f64 {
        self.volume
    }
}

/// Static listing metadata for one tradable instrument.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    symbol: Symbol,
    name: String,
    exchange: Exchange,
    list_date: Option<NaiveDate>,
}

impl Security {
    /// Creates a new security record.
    #[must_use]
    pub fn new(
        symbol: Symbol,
        name: impl Into<String>,
        exchange: Exchange,
        list_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            symbol,
            name: name.into(),
            exchange,
            list_date,
        }
    }

    /// Exchange-qualified symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Listing market.
    #[must_use]
    pub const fn exchange(&self) -> Exchange {
        self.exchange
    }

    /// Listing date, when the source exposes it.
    #[must_use]
    pub const fn list_date(&self) -> Option<NaiveDate> {
        self.list_date
    }
}
