//! Error types for the forecast_trade crate

use market_data::ProviderError;
use thiserror::Error;

/// Failures raised by any stage of the forecasting pipeline
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Fewer usable feature rows than the windowing stage needs
    #[error("Insufficient data: need at least {required} feature rows, got {available}")]
    InsufficientData { required: usize, available: usize },

    /// The market-data collaborator failed or returned nothing
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Non-finite values reached the model or came out of it
    #[error("Numeric error: {0}")]
    Numeric(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Tensor or autograd failure
    #[error("Model error: {0}")]
    Model(#[from] candle_core::Error),

    /// Indicator calculation failure
    #[error("Math error: {0}")]
    Math(#[from] trade_math::MathError),

    /// Unreadable or inconsistent configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Config(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ForecastError {
    fn from(err: ndarray::ShapeError) -> Self {
        ForecastError::InvalidParameter(err.to_string())
    }
}
