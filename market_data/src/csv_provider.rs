//! CSV-backed provider
//!
//! Files use a `date,open,high,low,close,volume` header (Yahoo-style
//! capitalised headers are accepted too) with ISO dates.

use crate::{trim_to_lookback, validate_series, Lookback, MarketDataProvider, PriceBar, ProviderError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct BarRecord {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume")]
    volume: f64,
}

impl From<BarRecord> for PriceBar {
    fn from(r: BarRecord) -> Self {
        PriceBar::new(r.date, r.open, r.high, r.low, r.close, r.volume.max(0.0).round() as u64)
    }
}

/// Read every bar in a CSV file, in file order
pub fn read_bars_csv<P: AsRef<Path>>(path: P) -> Result<Vec<PriceBar>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let mut bars = Vec::new();
    for record in reader.deserialize::<BarRecord>() {
        bars.push(record?.into());
    }
    Ok(bars)
}

/// Serves `<root>/<SYMBOL>.csv`
#[derive(Debug, Clone)]
pub struct CsvDirectoryProvider {
    root: PathBuf,
}

impl CsvDirectoryProvider {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Path of the file backing `symbol`
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.root.join(format!("{}.csv", symbol.to_uppercase()))
    }
}

impl MarketDataProvider for CsvDirectoryProvider {
    fn history(&self, symbol: &str, lookback: Lookback) -> Result<Vec<PriceBar>> {
        let path = self.path_for(symbol);
        if !path.is_file() {
            return Err(ProviderError::NotFound(symbol.to_string()));
        }

        let bars = read_bars_csv(&path)?;
        validate_series(symbol, &bars)?;
        let bars = trim_to_lookback(bars, lookback);
        debug!(symbol, path = %path.display(), bars = bars.len(), "loaded csv history");

        Ok(bars)
    }

    fn name(&self) -> &str {
        "csv"
    }
}
