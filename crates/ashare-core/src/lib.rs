#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ashare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for A-share market data providers.
//!
//! This crate provides the foundational abstractions:
//!
//! - [`DataProvider`](provider::DataProvider) - Base trait for all providers
//! - [`MarketDataProvider`](provider::MarketDataProvider) - Listings and daily bars
//! - [`Bar`](types::Bar) and [`Security`](types::Security) - Immutable records
//! - [`BarSeries`](series::BarSeries) - Daily bar query result

/// Error types for data operations.
pub mod error;
/// Provider traits for fetching market data.
pub mod provider;
/// Daily bar query results.
pub mod series;
/// Core data types (Symbol, Bar, Security, Exchange).
pub mod types;

// Re-export commonly used items at crate root
pub use error::{DataError, Result};
pub use provider::{DataProvider, MarketDataProvider};
pub use series::{BarSeries, SkippedRow};
pub use types::{Bar, Exchange, Security, Symbol};
