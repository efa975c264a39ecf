//! Upstream query shapes and raw row types.
//!
//! [`AkshareSource`] captures exactly the two Akshare functions the provider
//! needs. Rows come back as [`ListingRow`] and [`DailyRow`], typed records that
//! tolerate the column-name and value-type drift seen across Akshare versions.

use std::fmt::Debug;

use ashare_core::{Exchange, Result};
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

/// The upstream functions the Akshare provider relies on.
///
/// Implemented by [`AkToolsClient`](crate::AkToolsClient) over HTTP and by
/// fabricated sources in tests.
pub trait AkshareSource: Send + Sync + Debug {
    /// Lists every instrument on one exchange
    /// (`stock_info_sz_name_code` / `stock_info_sh_name_code`).
    fn stock_info_name_code(&self, exchange: Exchange) -> Result<Vec<ListingRow>>;

    /// Returns the full, unadjusted daily history for an Akshare symbol such as
    /// `sz000001` (`stock_zh_a_daily`). The source has no date-range filter.
    fn stock_zh_a_daily(&self, ak_symbol: &str) -> Result<Vec<DailyRow>>;
}

/// One row of an exchange listing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ListingRow {
    /// Six-digit security code.
    #[serde(alias = "A股代码", alias = "证券代码", deserialize_with = "de_code")]
    pub code: String,
    /// Display name.
    #[serde(alias = "A股简称", alias = "证券简称")]
    pub name: String,
}

impl ListingRow {
    /// Creates a listing row.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// One row of a daily history.
///
/// Prices and volumes are optional so a single bad cell is reported against
/// its row rather than failing the whole response.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DailyRow {
    /// Trading date as text, expected as `YYYY-MM-DD`.
    #[serde(default, deserialize_with = "de_text")]
    pub date: String,
    /// Opening price.
    #[serde(default, deserialize_with = "de_number")]
    pub open: Option<f64>,
    /// Highest price.
    #[serde(default, deserialize_with = "de_number")]
    pub high: Option<f64>,
    /// Lowest price.
    #[serde(default, deserialize_with = "de_number")]
    pub low: Option<f64>,
    /// Closing price.
    #[serde(default, deserialize_with = "de_number")]
    pub close: Option<f64>,
    /// Volume under its primary column name.
    #[serde(default, deserialize_with = "de_volume")]
    pub volume: Option<VolumeCell>,
    /// Volume under the alternate column name used by some endpoints.
    #[serde(default, deserialize_with = "de_volume")]
    pub vol: Option<VolumeCell>,
}

/// A volume cell that was present in the row.
///
/// Absent and null cells are `None` on [`DailyRow`]; a cell holding
/// something other than a finite number is kept as [`VolumeCell::Invalid`]
/// so it can be reported instead of read as zero.
#[derive(Clone, Debug, PartialEq)]
pub enum VolumeCell {
    /// A finite number.
    Number(f64),
    /// The raw cell text when it is not a finite number.
    Invalid(String),
}

impl DailyRow {
    /// Creates a row with all prices and the volume under its primary name.
    #[must_use]
    pub fn new(
        date: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            date: date.into(),
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(VolumeCell::Number(volume)),
            vol: None,
        }
    }

    /// Resolves the traded volume: `volume` first, then `vol`, else zero.
    ///
    /// The first present cell decides. It is an error if that cell is not a
    /// number or is negative.
    pub fn resolved_volume(&self) -> std::result::Result<f64, String> {
        match self.volume.as_ref().or(self.vol.as_ref()) {
            None => Ok(0.0),
            Some(VolumeCell::Number(v)) if *v >= 0.0 => Ok(*v),
            Some(VolumeCell::Number(v)) => Err(format!("negative volume {v}")),
            Some(VolumeCell::Invalid(raw)) => Err(format!("unparseable volume {raw:?}")),
        }
    }
}

/// Accepts a code as text or as a number; numbers are zero-padded to six digits.
fn de_code<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => n
            .as_u64()
            .map(|code| format!("{code:06}"))
            .ok_or_else(|| de::Error::custom(format!("invalid security code: {n}"))),
        other => Err(de::Error::custom(format!("invalid security code: {other}"))),
    }
}

fn de_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Accepts numbers and numeric strings; anything else, including NaN and
/// infinities, becomes `None`.
fn de_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

/// Null means absent; anything else is kept, parsed or not.
fn de_volume<'de, D>(deserializer: D) -> std::result::Result<Option<VolumeCell>, D::Error>
where
    D: Deserializer<'de>,
{
    let cell = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(None),
        Value::Number(n) => match n.as_f64().filter(|v| v.is_finite()) {
            Some(v) => VolumeCell::Number(v),
            None => VolumeCell::Invalid(n.to_string()),
        },
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => VolumeCell::Number(v),
            _ => VolumeCell::Invalid(s),
        },
        other => VolumeCell::Invalid(other.to_string()),
    };
    Ok(Some(cell))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_row_plain_columns() {
        let row: ListingRow =
            serde_json::from_str(r#"{"code": "000001", "name": "平安银行"}"#).unwrap();
        assert_eq!(row, ListingRow::new("000001", "平安银行"));
    }

    #[test]
    fn test_listing_row_exchange_columns() {
        let sz: ListingRow = serde_json::from_str(
            r#"{"板块": "主板", "A股代码": "000002", "A股简称": "万科A", "A股上市日期": "1991-01-29"}"#,
        )
        .unwrap();
        assert_eq!(sz.code, "000002");
        assert_eq!(sz.name, "万科A");

        let sh: ListingRow = serde_json::from_str(
            r#"{"证券代码": "600000", "证券简称": "浦发银行", "公司全称": "上海浦东发展银行股份有限公司"}"#,
        )
        .unwrap();
        assert_eq!(sh.code, "600000");
        assert_eq!(sh.name, "浦发银行");
    }

    #[test]
    fn test_numeric_code_is_zero_padded() {
        let row: ListingRow = serde_json::from_str(r#"{"code": 1, "name": "平安银行"}"#).unwrap();
        assert_eq!(row.code, "000001");
    }

    #[test]
    fn test_daily_row_tolerates_value_types() {
        let row: DailyRow = serde_json::from_str(
            r#"{"date": "2024-01-02", "open": "10.0", "high": 10.5, "low": null, "close": 10.2, "volume": 1000000}"#,
        )
        .unwrap();
        assert_eq!(row.date, "2024-01-02");
        assert_eq!(row.open, Some(10.0));
        assert_eq!(row.high, Some(10.5));
        assert_eq!(row.low, None);
        assert_eq!(row.close, Some(10.2));
        assert_eq!(row.resolved_volume(), Ok(1_000_000.0));
    }

    #[test]
    fn test_volume_alias_resolution() {
        let primary = DailyRow::new("2024-01-02", 10.0, 10.5, 9.8, 10.2, 1200.0);
        let alias = DailyRow {
            volume: None,
            vol: Some(VolumeCell::Number(1200.0)),
            ..primary.clone()
        };
        let neither = DailyRow {
            volume: None,
            vol: None,
            ..primary.clone()
        };

        assert_eq!(primary.resolved_volume(), alias.resolved_volume());
        assert_eq!(neither.resolved_volume(), Ok(0.0));
    }

    #[test]
    fn test_primary_volume_wins_over_alias() {
        let row: DailyRow =
            serde_json::from_str(r#"{"date": "2024-01-02", "volume": 5, "vol": 7}"#).unwrap();
        assert_eq!(row.resolved_volume(), Ok(5.0));
    }

    #[test]
    fn test_null_volume_falls_back_to_alias() {
        let row: DailyRow =
            serde_json::from_str(r#"{"date": "2024-01-02", "volume": null, "vol": "7"}"#)
                .unwrap();
        assert_eq!(row.volume, None);
        assert_eq!(row.resolved_volume(), Ok(7.0));
    }

    #[test]
    fn test_unparseable_volume_is_an_error() {
        let row: DailyRow =
            serde_json::from_str(r#"{"date": "2024-01-02", "volume": "n/a", "vol": null}"#)
                .unwrap();
        assert_eq!(row.volume, Some(VolumeCell::Invalid("n/a".into())));

        let reason = row.resolved_volume().unwrap_err();
        assert!(reason.contains("n/a"), "{reason}");
    }

    #[test]
    fn test_unparseable_volume_does_not_fall_back_to_alias() {
        let row: DailyRow =
            serde_json::from_str(r#"{"date": "2024-01-02", "volume": "", "vol": 7}"#).unwrap();
        assert!(row.resolved_volume().is_err());
    }

    #[test]
    fn test_negative_volume_is_an_error() {
        let row = DailyRow::new("2024-01-02", 10.0, 10.5, 9.8, 10.2, -500.0);
        let reason = row.resolved_volume().unwrap_err();
        assert!(reason.contains("negative"), "{reason}");
    }

    #[test]
    fn test_non_finite_numbers_are_missing() {
        let row: DailyRow =
            serde_json::from_str(r#"{"date": "2024-01-02", "open": "NaN", "close": "inf"}"#)
                .unwrap();
        assert_eq!(row.open, None);
        assert_eq!(row.close, None);
    }

    #[test]
    fn test_missing_date_is_empty() {
        let row: DailyRow = serde_json::from_str(r#"{"open": 1.0}"#).unwrap();
        assert!(row.date.is_empty());
    }
}
