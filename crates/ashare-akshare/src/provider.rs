//! Akshare-backed [`MarketDataProvider`].

use ashare_core::{
    Bar, BarSeries, DataError, DataProvider, Exchange, MarketDataProvider, Result, Security,
    SkippedRow, Symbol,
};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

use crate::client::{AkToolsClient, AkToolsConfig};
use crate::source::{AkshareSource, DailyRow};
use crate::symbol::to_ak_symbol;

/// Date format of the `date` column in daily history rows.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Akshare data provider.
///
/// Implements [`DataProvider`] and [`MarketDataProvider`] on top of any
/// [`AkshareSource`]; by default an [`AkToolsClient`].
#[derive(Debug)]
pub struct AkshareProvider<S = AkToolsClient> {
    source: S,
}

impl AkshareProvider<AkToolsClient> {
    /// Create a provider talking to an AKTools server with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(&AkToolsConfig::default())
    }

    /// Create a provider configured from `AKTOOLS_URL` / `AKTOOLS_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::with_config(&AkToolsConfig::from_env()?)
    }

    /// Create a provider from explicit connection settings.
    pub fn with_config(config: &AkToolsConfig) -> Result<Self> {
        Ok(Self::with_source(AkToolsClient::new(config)?))
    }
}

impl<S: AkshareSource> AkshareProvider<S> {
    /// Create a provider over an arbitrary upstream source.
    #[must_use]
    pub const fn with_source(source: S) -> Self {
        Self { source }
    }

    /// The upstream source this provider reads from.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Lists the securities of a single exchange, each symbol once.
    ///
    /// Failures are reported as [`DataError::SourceUnavailable`].
    pub fn exchange_listing(&self, exchange: Exchange) -> Result<Vec<Security>> {
        let rows = self
            .source
            .stock_info_name_code(exchange)
            .map_err(|e| match e {
                DataError::SourceUnavailable(_) => e,
                other => DataError::SourceUnavailable(format!("{exchange} listing: {other}")),
            })?;

        debug!(%exchange, count = rows.len(), "Fetched exchange listing");

        // The listing endpoints do not expose a listing date.
        let mut securities: Vec<Security> = rows
            .into_iter()
            .map(|row| {
                Security::new(
                    Symbol::from_code(&row.code, exchange),
                    row.name.trim(),
                    exchange,
                    None,
                )
            })
            .collect();

        let before = securities.len();
        let mut seen = HashSet::new();
        securities.retain(|s| seen.insert(s.symbol().clone()));
        if securities.len() < before {
            warn!(
                %exchange,
                duplicates = before - securities.len(),
                "Dropped duplicate listing rows"
            );
        }

        Ok(securities)
    }
}

impl<S: AkshareSource> DataProvider for AkshareProvider<S> {
    fn name(&self) -> &str {
        "Akshare"
    }

    fn description(&self) -> &str {
        "Akshare provider for A-share listings and unadjusted daily bars"
    }
}

impl<S: AkshareSource> MarketDataProvider for AkshareProvider<S> {
    #[instrument(skip(self))]
    fn list_securities(&self) -> Result<Vec<Security>> {
        let mut out = Vec::new();
        for exchange in Exchange::ALL {
            out.extend(self.exchange_listing(exchange)?);
        }
        Ok(out)
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    fn daily_bars(&self, symbol: &Symbol, start: NaiveDate, end: NaiveDate) -> Result<BarSeries> {
        let ak_symbol = to_ak_symbol(symbol)?;

        if start > end {
            debug!(%start, %end, "Inverted date range, returning no bars");
            return Ok(BarSeries::empty(symbol.clone()));
        }

        // Full history only; the range is applied here.
        let rows = self.source.stock_zh_a_daily(&ak_symbol)?;
        Ok(normalize_daily_rows(symbol, &rows, start, end))
    }
}

/// Filters raw daily rows to `[start, end]` and converts them into bars.
///
/// Upstream order is kept as-is. Malformed rows are skipped and recorded in
/// the returned series.
pub(crate) fn normalize_daily_rows(
    symbol: &Symbol,
    rows: &[DailyRow],
    start: NaiveDate,
    end: NaiveDate,
) -> BarSeries {
    let mut bars = Vec::new();
    let mut skipped = Vec::new();
    let mut previous: Option<NaiveDate> = None;
    let mut out_of_order = 0usize;

    for (index, row) in rows.iter().enumerate() {
        match normalize_row(symbol, index, row, start, end) {
            Ok((date, bar)) => {
                if previous.is_some_and(|p| date <= p) {
                    out_of_order += 1;
                }
                previous = Some(date);
                bars.extend(bar);
            }
            Err(skip) => {
                warn!(%symbol, index = skip.index, reason = %skip.reason, "Skipping malformed row");
                skipped.push(skip);
            }
        }
    }

    if out_of_order > 0 {
        warn!(
            %symbol,
            out_of_order,
            "Upstream rows are not in ascending date order; order preserved"
        );
    }

    debug!(
        %symbol,
        rows = rows.len(),
        bars = bars.len(),
        skipped = skipped.len(),
        "Normalized daily rows"
    );

    BarSeries::new(symbol.clone(), bars, skipped)
}

/// Parses one row. Returns its date and, when inside the range, the bar.
fn normalize_row(
    symbol: &Symbol,
    index: usize,
    row: &DailyRow,
    start: NaiveDate,
    end: NaiveDate,
) -> std::result::Result<(NaiveDate, Option<Bar>), SkippedRow> {
    let date = NaiveDate::parse_from_str(row.date.trim(), DATE_FORMAT).map_err(|e| SkippedRow {
        index,
        reason: format!("invalid date {:?}: {e}", row.date),
    })?;

    if date < start || date > end {
        return Ok((date, None));
    }

    let price = |value: Option<f64>, field: &str| {
        value.ok_or_else(|| SkippedRow {
            index,
            reason: format!("missing {field} on {date}"),
        })
    };

    let volume = row.resolved_volume().map_err(|reason| SkippedRow {
        index,
        reason: format!("{reason} on {date}"),
    })?;

    let bar = Bar::new(
        symbol.clone(),
        date.and_time(chrono::NaiveTime::MIN),
        price(row.open, "open")?,
        price(row.high, "high")?,
        price(row.low, "low")?,
        price(row.close, "close")?,
        volume,
    );

    Ok((date, Some(bar)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ListingRow, VolumeCell};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stands in for AKTools with canned rows.
    #[derive(Debug, Default)]
    struct FakeSource {
        sz: Vec<ListingRow>,
        sh: Vec<ListingRow>,
        daily: Vec<DailyRow>,
        fail_listing: Option<Exchange>,
        daily_error: Option<DataError>,
        daily_calls: AtomicUsize,
        requested: Mutex<Vec<String>>,
    }

    impl AkshareSource for FakeSource {
        fn stock_info_name_code(&self, exchange: Exchange) -> Result<Vec<ListingRow>> {
            if self.fail_listing == Some(exchange) {
                return Err(DataError::SourceUnavailable("connection refused".into()));
            }
            if exchange == Exchange::Szse {
                Ok(self.sz.clone())
            } else {
                Ok(self.sh.clone())
            }
        }

        fn stock_zh_a_daily(&self, ak_symbol: &str) -> Result<Vec<DailyRow>> {
            self.daily_calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().unwrap().push(ak_symbol.to_string());
            match &self.daily_error {
                Some(e) => Err(e.clone()),
                None => Ok(self.daily.clone()),
            }
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn two_day_source() -> FakeSource {
        FakeSource {
            sz: vec![ListingRow::new("000001", "平安银行")],
            sh: vec![ListingRow::new("600000", "浦发银行")],
            daily: vec![
                DailyRow::new("2024-01-02", 10.0, 10.5, 9.8, 10.2, 1_000_000.0),
                DailyRow::new("2024-01-03", 10.2, 10.7, 10.0, 10.6, 1_200_000.0),
            ],
            ..Default::default()
        }
    }

    fn week_source() -> FakeSource {
        FakeSource {
            daily: (1..=5)
                .map(|d| {
                    DailyRow::new(format!("2024-01-0{d}"), 10.0, 11.0, 9.0, 10.0 + d as f64, 100.0)
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_provider_info() {
        let provider = AkshareProvider::with_source(FakeSource::default());
        assert_eq!(provider.name(), "Akshare");
        assert!(!provider.description().is_empty());
    }

    #[test]
    fn test_daily_bars_in_range() {
        let provider = AkshareProvider::with_source(two_day_source());
        let symbol = Symbol::new("000001.SZ");

        let bars = provider
            .daily_bars(&symbol, date(2024, 1, 2), date(2024, 1, 3))
            .unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close(), 10.2);
        assert_eq!(bars[1].close(), 10.6);
        assert!(bars[0].timestamp() < bars[1].timestamp());
        assert!(bars.is_complete());
        assert_eq!(bars[0].symbol(), &symbol);
    }

    #[test]
    fn test_daily_bars_without_overlap_is_empty() {
        let provider = AkshareProvider::with_source(two_day_source());

        let bars = provider
            .daily_bars(&Symbol::new("000001.SZ"), date(2024, 1, 4), date(2024, 1, 10))
            .unwrap();

        assert!(bars.is_empty());
        assert!(bars.is_complete());
    }

    #[test]
    fn test_inverted_range_is_empty_and_skips_fetch() {
        let provider = AkshareProvider::with_source(two_day_source());

        let bars = provider
            .daily_bars(&Symbol::new("000001.SZ"), date(2024, 1, 3), date(2024, 1, 2))
            .unwrap();

        assert!(bars.is_empty());
        assert_eq!(provider.source().daily_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_range_is_inclusive_on_both_ends() {
        let provider = AkshareProvider::with_source(week_source());

        let bars = provider
            .daily_bars(&Symbol::new("000001.SZ"), date(2024, 1, 2), date(2024, 1, 4))
            .unwrap();

        let dates: Vec<NaiveDate> = bars.iter().map(Bar::trading_date).collect();
        assert_eq!(dates, vec![date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4)]);
    }

    #[test]
    fn test_single_day_range() {
        let provider = AkshareProvider::with_source(week_source());

        let bars = provider
            .daily_bars(&Symbol::new("000001.SZ"), date(2024, 1, 5), date(2024, 1, 5))
            .unwrap();

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close(), 15.0);
    }

    #[test]
    fn test_timestamps_are_midnight() {
        let provider = AkshareProvider::with_source(two_day_source());

        let bars = provider
            .daily_bars(&Symbol::new("000001.SZ"), date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();

        for bar in &bars {
            assert_eq!(bar.timestamp().time(), chrono::NaiveTime::MIN);
        }
    }

    #[test]
    fn test_symbol_is_translated_for_source() {
        let provider = AkshareProvider::with_source(two_day_source());

        provider
            .daily_bars(&Symbol::new("000001.SZ"), date(2024, 1, 2), date(2024, 1, 3))
            .unwrap();
        provider
            .daily_bars(&Symbol::new("600000.SH"), date(2024, 1, 2), date(2024, 1, 3))
            .unwrap();

        let requested = provider.source().requested.lock().unwrap().clone();
        assert_eq!(requested, vec!["sz000001", "sh600000"]);
    }

    #[test]
    fn test_invalid_symbol_fails_before_fetch() {
        let provider = AkshareProvider::with_source(two_day_source());

        let result = provider.daily_bars(&Symbol::new("000001"), date(2024, 1, 2), date(2024, 1, 3));

        assert!(matches!(result, Err(DataError::InvalidSymbolFormat(_))));
        assert_eq!(provider.source().daily_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_symbol_propagates() {
        let provider = AkshareProvider::with_source(FakeSource {
            daily_error: Some(DataError::UnknownSymbol("sz999999".into())),
            ..Default::default()
        });

        let result =
            provider.daily_bars(&Symbol::new("999999.SZ"), date(2024, 1, 2), date(2024, 1, 3));

        assert!(matches!(result, Err(DataError::UnknownSymbol(_))));
    }

    #[test]
    fn test_source_unavailable_propagates() {
        let provider = AkshareProvider::with_source(FakeSource {
            daily_error: Some(DataError::SourceUnavailable("timeout".into())),
            ..Default::default()
        });

        let err = provider
            .daily_bars(&Symbol::new("000001.SZ"), date(2024, 1, 2), date(2024, 1, 3))
            .unwrap_err();

        assert!(err.is_retryable());
    }

    #[test]
    fn test_daily_bars_is_idempotent() {
        let provider = AkshareProvider::with_source(week_source());
        let symbol = Symbol::new("000001.SZ");

        let first = provider
            .daily_bars(&symbol, date(2024, 1, 1), date(2024, 1, 5))
            .unwrap();
        let second = provider
            .daily_bars(&symbol, date(2024, 1, 1), date(2024, 1, 5))
            .unwrap();

        assert_eq!(first, second);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.close().to_bits(), b.close().to_bits());
            assert_eq!(a.volume().to_bits(), b.volume().to_bits());
        }
    }

    #[test]
    fn test_volume_alias_yields_same_bar() {
        let primary = DailyRow::new("2024-01-02", 10.0, 10.5, 9.8, 10.2, 5_000.0);
        let alias = DailyRow {
            volume: None,
            vol: Some(VolumeCell::Number(5_000.0)),
            ..primary.clone()
        };
        let symbol = Symbol::new("000001.SZ");

        let a = normalize_daily_rows(&symbol, &[primary], date(2024, 1, 1), date(2024, 1, 31));
        let b = normalize_daily_rows(&symbol, &[alias], date(2024, 1, 1), date(2024, 1, 31));

        assert_eq!(a[0].volume(), b[0].volume());
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_volume_defaults_to_zero() {
        let row = DailyRow {
            volume: None,
            ..DailyRow::new("2024-01-02", 10.0, 10.5, 9.8, 10.2, 0.0)
        };

        let series = normalize_daily_rows(
            &Symbol::new("000001.SZ"),
            &[row],
            date(2024, 1, 1),
            date(2024, 1, 31),
        );

        assert_eq!(series[0].volume(), 0.0);
    }

    #[test]
    fn test_malformed_rows_are_skipped_and_reported() {
        let rows = vec![
            DailyRow::new("2024-01-02", 10.0, 10.5, 9.8, 10.2, 100.0),
            DailyRow::new("2024/01/03", 10.2, 10.7, 10.0, 10.6, 100.0),
            DailyRow {
                close: None,
                ..DailyRow::new("2024-01-04", 10.6, 10.9, 10.4, 0.0, 100.0)
            },
            DailyRow::new("2024-01-05", 10.8, 11.0, 10.5, 10.9, 100.0),
        ];

        let series = normalize_daily_rows(
            &Symbol::new("000001.SZ"),
            &rows,
            date(2024, 1, 1),
            date(2024, 1, 31),
        );

        let closes: Vec<f64> = series.iter().map(Bar::close).collect();
        assert_eq!(closes, vec![10.2, 10.9]);

        let indices: Vec<usize> = series.skipped().iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert!(series.skipped()[1].reason.contains("close"));
    }

    #[test]
    fn test_bad_volume_rows_are_skipped_and_reported() {
        let rows = vec![
            DailyRow {
                volume: Some(VolumeCell::Invalid("n/a".into())),
                vol: None,
                ..DailyRow::new("2024-01-02", 10.0, 10.5, 9.8, 10.2, 0.0)
            },
            DailyRow::new("2024-01-03", 10.2, 10.7, 10.0, 10.6, -500.0),
            DailyRow::new("2024-01-04", 10.6, 10.9, 10.4, 10.8, 900.0),
        ];

        let series = normalize_daily_rows(
            &Symbol::new("000001.SZ"),
            &rows,
            date(2024, 1, 1),
            date(2024, 1, 31),
        );

        let volumes: Vec<f64> = series.iter().map(Bar::volume).collect();
        assert_eq!(volumes, vec![900.0]);
        assert!(!series.is_complete());

        let indices: Vec<usize> = series.skipped().iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert!(series.skipped()[0].reason.contains("n/a"));
        assert!(series.skipped()[1].reason.contains("negative"));
    }

    #[test]
    fn test_missing_price_outside_range_is_not_reported() {
        let row = DailyRow {
            open: None,
            ..DailyRow::new("2023-12-29", 0.0, 10.0, 9.0, 9.5, 1.0)
        };

        let series = normalize_daily_rows(
            &Symbol::new("000001.SZ"),
            &[row],
            date(2024, 1, 1),
            date(2024, 1, 31),
        );

        assert!(series.is_empty());
        assert!(series.is_complete());
    }

    #[test]
    fn test_upstream_order_is_preserved() {
        let rows = vec![
            DailyRow::new("2024-01-03", 10.2, 10.7, 10.0, 10.6, 100.0),
            DailyRow::new("2024-01-02", 10.0, 10.5, 9.8, 10.2, 100.0),
        ];

        let series = normalize_daily_rows(
            &Symbol::new("000001.SZ"),
            &rows,
            date(2024, 1, 1),
            date(2024, 1, 31),
        );

        let closes: Vec<f64> = series.iter().map(Bar::close).collect();
        assert_eq!(closes, vec![10.6, 10.2]);
    }

    #[test]
    fn test_list_securities_aggregates_exchanges() {
        let provider = AkshareProvider::with_source(FakeSource {
            sz: vec![
                ListingRow::new("000001", "平安银行"),
                ListingRow::new("000002", "万科A"),
            ],
            sh: vec![ListingRow::new("600000", "浦发银行")],
            ..Default::default()
        });

        let securities = provider.list_securities().unwrap();
        assert_eq!(securities.len(), 3);

        let symbols: Vec<&str> = securities.iter().map(|s| s.symbol().as_str()).collect();
        assert_eq!(symbols, vec!["000001.SZ", "000002.SZ", "600000.SH"]);

        assert_eq!(securities[0].exchange(), Exchange::Szse);
        assert_eq!(securities[1].exchange(), Exchange::Szse);
        assert_eq!(securities[2].exchange(), Exchange::Sse);
        assert_eq!(securities[0].name(), "平安银行");
        assert!(securities.iter().all(|s| s.list_date().is_none()));
    }

    #[test]
    fn test_list_securities_fails_when_one_exchange_fails() {
        for failing in Exchange::ALL {
            let provider = AkshareProvider::with_source(FakeSource {
                fail_listing: Some(failing),
                ..two_day_source()
            });

            let result = provider.list_securities();
            assert!(
                matches!(result, Err(DataError::SourceUnavailable(_))),
                "{failing} failure should fail the listing"
            );
        }
    }

    #[test]
    fn test_duplicate_listing_rows_appear_once() {
        let provider = AkshareProvider::with_source(FakeSource {
            sz: vec![
                ListingRow::new("000001", "平安银行"),
                ListingRow::new("000002", "万科A"),
                ListingRow::new("000001", "平安银行"),
            ],
            sh: vec![ListingRow::new("600000", "浦发银行")],
            ..Default::default()
        });

        let securities = provider.list_securities().unwrap();
        let symbols: Vec<&str> = securities.iter().map(|s| s.symbol().as_str()).collect();
        assert_eq!(symbols, vec!["000001.SZ", "000002.SZ", "600000.SH"]);
    }

    #[test]
    fn test_exchange_listing_single_exchange() {
        let provider = AkshareProvider::with_source(two_day_source());

        let sh = provider.exchange_listing(Exchange::Sse).unwrap();
        assert_eq!(sh.len(), 1);
        assert_eq!(sh[0].symbol().as_str(), "600000.SH");
        assert_eq!(sh[0].name(), "浦发银行");
    }

    #[test]
    fn test_usable_through_trait_object() {
        let provider = AkshareProvider::with_source(two_day_source());
        let dyn_provider: &dyn MarketDataProvider = &provider;

        let securities = dyn_provider.list_securities().unwrap();
        assert_eq!(securities.len(), 2);
    }
}
