//! # Market Data
//!
//! `market_data` defines the daily OHLCV bar type consumed by the forecasting
//! engine and the [`MarketDataProvider`] contract that supplies it.
//!
//! Providers return bars strictly ascending by date. Three implementations
//! ship with the crate:
//!
//! - [`CsvDirectoryProvider`]: one `<SYMBOL>.csv` file per symbol
//! - [`InMemoryProvider`]: pre-loaded series, handy for tests and embedding
//! - [`SyntheticProvider`]: a seeded random walk per symbol
//!
//! ## Usage Example
//!
//! ```no_run
//! use market_data::{Lookback, MarketDataProvider, SyntheticProvider};
//!
//! let provider = SyntheticProvider::default();
//! let bars = provider.history("AAPL", Lookback::two_years()).unwrap();
//! println!("{} bars, last close {:.2}", bars.len(), bars.last().unwrap().close);
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod calendar;
pub mod csv_provider;
pub mod memory;
pub mod synthetic;

pub use csv_provider::{read_bars_csv, CsvDirectoryProvider};
pub use memory::InMemoryProvider;
pub use synthetic::{generate_bars, SyntheticProvider};

/// Errors raised by market-data providers
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("No price data returned for {0}")]
    Empty(String),

    #[error("Unknown symbol: {0}")]
    NotFound(String),

    #[error("Bars for {symbol} are not strictly ascending by date at row {row}")]
    Unordered { symbol: String, row: usize },

    #[error("Invalid bar for {symbol} on {date}: {reason}")]
    InvalidBar {
        symbol: String,
        date: NaiveDate,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// One trading day of OHLCV data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading date
    pub date: NaiveDate,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Traded volume
    pub volume: u64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// How much history to request, in calendar days ending at the latest bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookback {
    days: u32,
}

impl Lookback {
    pub fn days(days: u32) -> Self {
        Self { days }
    }

    /// Roughly two years of daily history
    pub fn two_years() -> Self {
        Self::days(730)
    }

    pub fn as_days(&self) -> u32 {
        self.days
    }

    /// First date included when the window ends on `last`
    pub fn start_for(&self, last: NaiveDate) -> NaiveDate {
        last - chrono::Duration::days(i64::from(self.days))
    }
}

impl Default for Lookback {
    fn default() -> Self {
        Self::two_years()
    }
}

/// Supplier of historical daily bars for a symbol
///
/// Implementations must return bars strictly ascending by date with at least
/// close and volume populated.
pub trait MarketDataProvider: Send + Sync {
    /// Fetch the bars for `symbol` that fall inside `lookback`
    fn history(&self, symbol: &str, lookback: Lookback) -> Result<Vec<PriceBar>>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Box<P> {
    fn history(&self, symbol: &str, lookback: Lookback) -> Result<Vec<PriceBar>> {
        (**self).history(symbol, lookback)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for std::sync::Arc<P> {
    fn history(&self, symbol: &str, lookback: Lookback) -> Result<Vec<PriceBar>> {
        (**self).history(symbol, lookback)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Check the provider contract: non-empty, strictly ascending dates, finite
/// positive closes.
pub fn validate_series(symbol: &str, bars: &[PriceBar]) -> Result<()> {
    if bars.is_empty() {
        return Err(ProviderError::Empty(symbol.to_string()));
    }

    for (row, bar) in bars.iter().enumerate() {
        if !bar.close.is_finite() || bar.close <= 0.0 {
            return Err(ProviderError::InvalidBar {
                symbol: symbol.to_string(),
                date: bar.date,
                reason: format!("close must be a positive number, got {}", bar.close),
            });
        }
        if row > 0 && bars[row - 1].date >= bar.date {
            return Err(ProviderError::Unordered {
                symbol: symbol.to_string(),
                row,
            });
        }
    }

    Ok(())
}

/// Keep only the bars inside `lookback`, measured back from the last bar
pub fn trim_to_lookback(bars: Vec<PriceBar>, lookback: Lookback) -> Vec<PriceBar> {
    let Some(last) = bars.last().map(|b| b.date) else {
        return bars;
    };
    let start = lookback.start_for(last);
    bars.into_iter().filter(|b| b.date > start).collect()
}
