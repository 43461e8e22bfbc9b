//! # Forecast Trade
//!
//! Short-horizon price forecasting for a single symbol.
//!
//! ## Pipeline
//!
//! - Technical-indicator features (RSI, MACD, Bollinger bands, returns, moving averages)
//! - Per-column min-max scaling with an exact inverse
//! - Fixed-length supervised windows in chronological order
//! - A small transformer encoder trained from scratch on every request
//! - A multi-day forecast, de-scaled to prices, plus a discrete trade signal
//!
//! Each request is independent: nothing learned is kept between calls.
//!
//! ## Quick Start
//!
//! ```no_run
//! use forecast_trade::{ForecastConfig, ForecastService};
//! use market_data::SyntheticProvider;
//!
//! let service = ForecastService::new(SyntheticProvider::default(), ForecastConfig::default())?;
//! let result = service.forecast("AAPL")?;
//! println!("{} {} -> {} ({})", result.symbol, result.current_price, result.target_price, result.signal);
//! # Ok::<(), forecast_trade::ForecastError>(())
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod observer;
pub mod scaler;
pub mod service;
pub mod signal;
pub mod trainer;
pub mod utils;
pub mod windows;

// Re-export commonly used types
pub use crate::config::{DeviceKind, ForecastConfig};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{FeatureBuilder, FeatureTable, FEATURE_COLUMNS};
pub use crate::models::{ForecastModel, ModelShape};
pub use crate::observer::{EpochProgress, NoopObserver, PipelineObserver, PipelineStage};
pub use crate::scaler::MinMaxScaler;
pub use crate::service::{
    ForecastPoint, ForecastResponse, ForecastResult, ForecastService, HealthStatus, HistoryPoint,
    PipelineReport,
};
pub use crate::signal::TradeSignal;
pub use crate::trainer::{Trainer, TrainingReport};
pub use crate::windows::{SequenceWindower, WindowSet};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
