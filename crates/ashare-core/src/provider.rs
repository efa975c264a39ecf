//! Provider traits for fetching market data.
//!
//! This module defines the core provider traits:
//!
//! - [`DataProvider`] - Base trait for all data providers
//! - [`MarketDataProvider`] - Security listings and daily bars
//!
//! Callers should depend on these traits (`&dyn MarketDataProvider` or a
//! generic bound) rather than a concrete provider, so sources can be swapped
//! without touching caller code.

use chrono::NaiveDate;
use std::fmt::Debug;

use crate::{
    error::Result,
    series::BarSeries,
    types::{Security, Symbol},
};

/// Base trait for all data providers.
///
/// All data providers must implement this trait to provide basic metadata
/// about the provider.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "Akshare").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Provider for security listings and daily OHLCV bars.
///
/// Every operation blocks until all upstream calls complete or fail.
/// Implementations hold no per-call mutable state, so one instance may be
/// shared across threads.
pub trait MarketDataProvider: DataProvider {
    /// Lists every tradable instrument known to the source.
    ///
    /// Each instrument appears exactly once; no ordering is guaranteed. Either
    /// the full enumeration is returned or the call fails with
    /// [`DataError::SourceUnavailable`](crate::DataError::SourceUnavailable).
    fn list_securities(&self) -> Result<Vec<Security>>;

    /// Fetches the daily bars for `symbol` whose trading date falls within
    /// `[start, end]`, both ends inclusive, in ascending timestamp order.
    ///
    /// An inverted range (`start > end`) yields an empty series. Rows that
    /// cannot be parsed are skipped and reported through
    /// [`BarSeries::skipped`].
    ///
    /// # Errors
    ///
    /// - [`DataError::InvalidSymbolFormat`](crate::DataError::InvalidSymbolFormat) for a malformed symbol
    /// - [`DataError::UnknownSymbol`](crate::DataError::UnknownSymbol) when the source reports no such instrument
    /// - [`DataError::SourceUnavailable`](crate::DataError::SourceUnavailable) on transport or service failure
    fn daily_bars(&self, symbol: &Symbol, start: NaiveDate, end: NaiveDate) -> Result<BarSeries>;
}
