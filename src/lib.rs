//! # QuantDesk
//!
//! Short-horizon price forecasting from the command line.
//!
//! The work happens in the workspace crates, re-exported here:
//!
//! - [`trade_math`]: streaming technical indicators
//! - [`market_data`]: price bars and the providers that supply them
//! - [`forecast_trade`]: features, scaling, windowing, the sequence model and
//!   the [`ForecastService`] that ties them together
//!
//! [`cli`] holds the `quantdesk` command definitions.

pub mod cli;

pub use forecast_trade;
pub use market_data;
pub use trade_math;

pub use forecast_trade::{ForecastConfig, ForecastResponse, ForecastService};
