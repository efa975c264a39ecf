//! AKTools HTTP client.
//!
//! AKTools serves Akshare functions over HTTP at
//! `{base_url}/api/public/{function}` and answers with a JSON array of
//! records, one per data-frame row.

use std::time::Duration;

use ashare_core::{DataError, Exchange, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::source::{AkshareSource, DailyRow, ListingRow};

/// Default AKTools address.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent for HTTP requests.
const USER_AGENT: &str = concat!("ashare/", env!("CARGO_PKG_VERSION"));

/// Environment variable holding the AKTools base URL.
pub const ENV_BASE_URL: &str = "AKTOOLS_URL";

/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "AKTOOLS_TIMEOUT_SECS";

/// Connection settings for an AKTools server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AkToolsConfig {
    /// Server address, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for AkToolsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AkToolsConfig {
    /// Creates a config for the given server address.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Config`] when the address is not an http(s) URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(&base_url.into())?,
            ..Self::default()
        })
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `AKTOOLS_URL` and `AKTOOLS_TIMEOUT_SECS`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup(ENV_BASE_URL) {
            Some(url) => Self::new(url)?,
            None => Self::default(),
        };

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                DataError::Config(format!("{ENV_TIMEOUT_SECS}={raw:?} is not a number: {e}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let url = raw.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(DataError::Config(format!(
            "AKTools URL must start with http:// or https://, got {raw:?}"
        )));
    }
    Ok(url.to_string())
}

/// Blocking HTTP client for an AKTools server.
#[derive(Debug, Clone)]
pub struct AkToolsClient {
    client: Client,
    base_url: String,
}

impl AkToolsClient {
    /// Creates a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &AkToolsConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| DataError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(&config.base_url)?,
        })
    }

    /// Creates a client around an existing HTTP client.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
        })
    }

    /// Server address requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, function: &str) -> String {
        format!("{}/api/public/{function}", self.base_url)
    }

    /// Calls one Akshare function and decodes its rows.
    ///
    /// `not_found` decides what an HTTP 404 means for this call.
    fn call<T: DeserializeOwned>(
        &self,
        function: &str,
        query: &[(&str, &str)],
        not_found: impl FnOnce() -> DataError,
    ) -> Result<Vec<T>> {
        let url = self.endpoint(function);
        debug!(%url, ?query, "AKTools request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| DataError::SourceUnavailable(format!("{function}: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(not_found());
        }
        if !status.is_success() {
            return Err(DataError::SourceUnavailable(format!(
                "{function}: HTTP {status}"
            )));
        }

        let text = response
            .text()
            .map_err(|e| DataError::SourceUnavailable(format!("{function}: {e}")))?;

        decode_rows(function, &text)
    }
}

impl AkshareSource for AkToolsClient {
    #[instrument(skip(self))]
    fn stock_info_name_code(&self, exchange: Exchange) -> Result<Vec<ListingRow>> {
        let function = match exchange {
            Exchange::Szse => "stock_info_sz_name_code",
            Exchange::Sse => "stock_info_sh_name_code",
            other => {
                return Err(DataError::SourceUnavailable(format!(
                    "no Akshare listing function for {other}"
                )));
            }
        };

        self.call(function, &[], || {
            DataError::SourceUnavailable(format!("{function}: not served by AKTools"))
        })
    }

    #[instrument(skip(self))]
    fn stock_zh_a_daily(&self, ak_symbol: &str) -> Result<Vec<DailyRow>> {
        let mut rows: Vec<DailyRow> = self.call(
            "stock_zh_a_daily",
            &[("symbol", ak_symbol), ("adjust", "")],
            || DataError::UnknownSymbol(ak_symbol.to_string()),
        )?;

        for row in &mut rows {
            strip_time_of_day(&mut row.date);
        }
        debug!(rows = rows.len(), "Fetched daily history");
        Ok(rows)
    }
}

/// Decodes an AKTools response body into rows.
fn decode_rows<T: DeserializeOwned>(function: &str, text: &str) -> Result<Vec<T>> {
    serde_json::from_str(text).map_err(|e| {
        let snippet: String = text.chars().take(200).collect();
        DataError::SourceUnavailable(format!("{function}: unexpected response ({e}): {snippet}"))
    })
}

/// AKTools renders dates as `2024-01-02T00:00:00.000`; keep the date part.
fn strip_time_of_day(date: &mut String) {
    if let Some(pos) = date.find('T') {
        date.truncate(pos);
    }
}
