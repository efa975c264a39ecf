//! Daily bar query results.
//!
//! [`BarSeries`] carries the normalized bars for one symbol together with the
//! upstream rows that were skipped because they could not be parsed, so data
//! loss is visible to the caller instead of silent.

use chrono::Datelike;
use polars::prelude::{Column, DataFrame, DataType, ParquetWriter};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::ops::Deref;
use std::path::Path;

use crate::{
    error::{DataError, Result},
    types::{Bar, Symbol},
};

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// An upstream row that was dropped during normalization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// Position of the row in the upstream response.
    pub index: usize,
    /// Why the row was rejected.
    pub reason: String,
}

impl From<SkippedRow> for DataError {
    fn from(row: SkippedRow) -> Self {
        Self::MalformedRow {
            index: row.index,
            reason: row.reason,
        }
    }
}

/// Ordered daily bars for one symbol.
///
/// Dereferences to `[Bar]`, so it can be used wherever a bar slice is expected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    symbol: Symbol,
    bars: Vec<Bar>,
    skipped: Vec<SkippedRow>,
}

impl BarSeries {
    /// Creates a series from normalized bars and the rows skipped along the way.
    #[must_use]
    pub const fn new(symbol: Symbol, bars: Vec<Bar>, skipped: Vec<SkippedRow>) -> Self {
        Self {
            symbol,
            bars,
            skipped,
        }
    }

    /// Creates a series with no bars.
    #[must_use]
    pub const fn empty(symbol: Symbol) -> Self {
        Self::new(symbol, Vec::new(), Vec::new())
    }

    /// Symbol the series was requested for.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// The bars, in upstream order.
    #[must_use]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Consumes the series and returns the bars.
    #[must_use]
    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }

    /// Rows dropped because they could not be parsed.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }

    /// Returns true if no upstream row was dropped as malformed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Converts the bars into a DataFrame.
    ///
    /// Columns: symbol, date, open, high, low, close, volume.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let dates: Vec<i32> = self
            .bars
            .iter()
            .map(|b| b.trading_date().num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            .collect();

        let date_col = Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Other(e.to_string()))?;

        DataFrame::new(vec![
            Column::new(
                "symbol".into(),
                self.bars
                    .iter()
                    .map(|b| b.symbol().as_str())
                    .collect::<Vec<_>>(),
            ),
            date_col,
            Column::new(
                "open".into(),
                self.bars.iter().map(Bar::open).collect::<Vec<_>>(),
            ),
            Column::new(
                "high".into(),
                self.bars.iter().map(Bar::high).collect::<Vec<_>>(),
            ),
            Column::new(
                "low".into(),
                self.bars.iter().map(Bar::low).collect::<Vec<_>>(),
            ),
            Column::new(
                "close".into(),
                self.bars.iter().map(Bar::close).collect::<Vec<_>>(),
            ),
            Column::new(
                "volume".into(),
                self.bars.iter().map(Bar::volume).collect::<Vec<_>>(),
            ),
        ])
        .map_err(|e| DataError::Other(e.to_string()))
    }

    /// Writes [`to_frame`](Self::to_frame) to a Parquet file at `path`.
    pub fn write_parquet(&self, path: &Path) -> Result<()> {
        let mut df = self.to_frame()?;
        let file = File::create(path)
            .map_err(|e| DataError::Other(format!("create {}: {e}", path.display())))?;
        ParquetWriter::new(file)
            .finish(&mut df)
            .map_err(|e| DataError::Other(format!("write parquet: {e}")))?;
        Ok(())
    }
}

impl Deref for BarSeries {
    type Target = [Bar];

    fn deref(&self) -> &Self::Target {
        &self.bars
    }
}

impl AsRef<[Bar]> for BarSeries {
    fn as_ref(&self) -> &[Bar] {
        &self.bars
    }
}

impl IntoIterator for BarSeries {
    type Item = Bar;
    type IntoIter = std::vec::IntoIter<Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.into_iter()
    }
}

impl<'a> IntoIterator for &'a BarSeries {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
