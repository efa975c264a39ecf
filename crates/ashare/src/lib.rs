#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ashare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! A-share market data facade.
//!
//! Re-exports the core model and provider traits, plus the Akshare provider
//! and chart renderer behind their features.
//!
//! # Features
//!
//! - `akshare` - Akshare provider backed by an AKTools server
//! - `chart` - Candlestick PNG rendering
//!
//! # Example
//!
//! ```rust,no_run
//! use ashare::{AkshareProvider, ChartConfig, MarketDataProvider, Symbol, plot_candle};
//! use chrono::NaiveDate;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = AkshareProvider::from_env()?;
//!     let symbol = Symbol::new("600000.SH");
//!     let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//!     let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
//!
//!     let bars = provider.daily_bars(&symbol, start, end)?;
//!     plot_candle(&bars, "600000.SH", "charts/600000.SH.png", &ChartConfig::default())?;
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use ashare_core::*;

// Providers
#[cfg(feature = "akshare")]
pub use ashare_akshare::{
    AkToolsClient, AkToolsConfig, AkshareProvider, AkshareSource, DEFAULT_BASE_URL,
};

// Charts
#[cfg(feature = "chart")]
pub use ashare_chart::{ChartConfig, ChartError, moving_average, plot_candle};
