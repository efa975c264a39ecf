#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ashare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Akshare data provider.
//!
//! This crate provides an Akshare-backed provider that implements the
//! [`DataProvider`](ashare_core::DataProvider) and
//! [`MarketDataProvider`](ashare_core::MarketDataProvider) traits from
//! `ashare-core`.
//!
//! # Example
//!
//! ```no_run
//! use ashare_akshare::AkshareProvider;
//! use ashare_core::{MarketDataProvider, Symbol};
//! use chrono::NaiveDate;
//!
//! # fn example() -> ashare_core::Result<()> {
//! let provider = AkshareProvider::from_env()?;
//! let symbol = Symbol::new("000001.SZ");
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
//!
//! let bars = provider.daily_bars(&symbol, start, end)?;
//! println!("Fetched {} bars, skipped {} rows", bars.len(), bars.skipped().len());
//! # Ok(())
//! # }
//! ```

mod client;
mod provider;
mod source;
mod symbol;

pub use client::{AkToolsClient, AkToolsConfig, DEFAULT_BASE_URL, ENV_BASE_URL, ENV_TIMEOUT_SECS};
pub use provider::AkshareProvider;
pub use source::{AkshareSource, DailyRow, ListingRow, VolumeCell};
pub use symbol::to_ak_symbol;
