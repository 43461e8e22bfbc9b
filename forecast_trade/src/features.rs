//! Technical-indicator feature engineering
//!
//! [`FeatureBuilder`] turns a date-ordered bar series into a [`FeatureTable`]:
//! one row per date, one column per entry of [`FEATURE_COLUMNS`]. Every
//! indicator is computed over the whole close column first; the leading rows
//! where any indicator is still warming up are then dropped in one cut.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use market_data::PriceBar;
use ndarray::{s, Array2, ArrayView1, ArrayView2};
use trade_math::series::{self, Column};
use tracing::debug;

/// Column order of every feature row
pub const FEATURE_COLUMNS: [&str; 14] = [
    "close",
    "volume",
    "rsi",
    "macd",
    "macd_signal",
    "bb_upper",
    "bb_lower",
    "bb_width",
    "return_1",
    "return_5",
    "return_10",
    "sma_20",
    "sma_50",
    "ema_12",
];

/// Position of the close price, which doubles as the regression target
pub const CLOSE_COLUMN: usize = 0;

/// Bars consumed before every indicator is defined (SMA(50) is the longest)
pub const WARMUP_ROWS: usize = 49;

const RSI_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const BOLLINGER_PERIOD: usize = 20;
const BOLLINGER_STD_DEVS: f64 = 2.0;

/// Dates plus a row-per-date numeric matrix with named columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    columns: Vec<&'static str>,
    values: Array2<f64>,
}

impl FeatureTable {
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<&'static str>, values: Array2<f64>) -> Result<Self> {
        if values.nrows() != dates.len() || values.ncols() != columns.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "table shape {:?} does not match {} dates and {} columns",
                values.dim(),
                dates.len(),
                columns.len()
            )));
        }
        Ok(Self {
            dates,
            columns,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// A single column by name
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let idx = self.columns.iter().position(|c| *c == name)?;
        Some(self.values.column(idx))
    }

    /// Close prices, one per row
    pub fn close(&self) -> ArrayView1<'_, f64> {
        self.values.column(CLOSE_COLUMN)
    }

    /// Last `n` rows (or all of them when shorter)
    pub fn tail(&self, n: usize) -> FeatureTable {
        let start = self.len().saturating_sub(n);
        FeatureTable {
            dates: self.dates[start..].to_vec(),
            columns: self.columns.clone(),
            values: self.values.slice(s![start.., ..]).to_owned(),
        }
    }

    /// First non-finite cell as `(row, column)`
    fn first_non_finite(&self) -> Option<(usize, usize)> {
        self.values
            .indexed_iter()
            .find(|(_, v)| !v.is_finite())
            .map(|(idx, _)| idx)
    }
}

/// Builds the indicator matrix and enforces the minimum usable length
#[derive(Debug, Clone, Copy)]
pub struct FeatureBuilder {
    min_rows: usize,
}

impl FeatureBuilder {
    /// `min_rows` is the fewest rows the caller can work with after warm-up
    pub fn new(min_rows: usize) -> Self {
        Self { min_rows }
    }

    pub fn min_rows(&self) -> usize {
        self.min_rows
    }

    /// Compute every feature column and drop the warm-up rows
    ///
    /// # Errors
    /// * [`ForecastError::InsufficientData`] when fewer than `min_rows` rows survive
    /// * [`ForecastError::Numeric`] when any surviving cell is not finite
    pub fn build(&self, bars: &[PriceBar]) -> Result<FeatureTable> {
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volume: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();

        let macd = series::macd(&close, MACD_FAST, MACD_SLOW, MACD_SIGNAL)?;
        let bands = series::bollinger(&close, BOLLINGER_PERIOD, BOLLINGER_STD_DEVS)?;

        let columns: Vec<Column> = vec![
            close.iter().copied().map(Some).collect(),
            volume.iter().copied().map(Some).collect(),
            series::rsi(&close, RSI_PERIOD)?,
            macd.line,
            macd.signal,
            bands.upper,
            bands.lower,
            bands.width,
            series::pct_change(&close, 1)?,
            series::pct_change(&close, 5)?,
            series::pct_change(&close, 10)?,
            series::sma(&close, 20)?,
            series::sma(&close, 50)?,
            series::ema(&close, 12)?,
        ];

        let refs: Vec<&Column> = columns.iter().collect();
        let start = series::first_complete_row(&refs).unwrap_or(bars.len());
        let rows = bars.len() - start;

        if rows < self.min_rows {
            return Err(ForecastError::InsufficientData {
                required: self.min_rows,
                available: rows,
            });
        }

        let values = Array2::from_shape_fn((rows, columns.len()), |(r, c)| {
            columns[c][start + r].unwrap_or(f64::NAN)
        });
        let dates = bars[start..].iter().map(|b| b.date).collect();
        let table = FeatureTable::new(dates, FEATURE_COLUMNS.to_vec(), values)?;

        if let Some((row, col)) = table.first_non_finite() {
            return Err(ForecastError::Numeric(format!(
                "feature '{}' is not finite on {}",
                table.columns[col], table.dates[row]
            )));
        }

        debug!(bars = bars.len(), rows, cols = table.columns.len(), "built feature table");
        Ok(table)
    }
}
