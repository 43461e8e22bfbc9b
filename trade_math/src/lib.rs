//! # Trade Math
//!
//! Technical indicator calculations used to engineer forecasting features.
//!
//! Every indicator is a small streaming state machine with an `update` /
//! `value` pair: `value` returns [`MathError::InsufficientData`] until the
//! indicator has seen its full lookback. The [`series`] module drives those
//! state machines over a whole column and reports the warm-up rows as `None`.

use thiserror::Error;

// Indicator modules
pub mod moving_averages;
pub mod oscillators;
pub mod returns;
pub mod series;
pub mod volatility;

pub use moving_averages::{ExponentialMovingAverage, SimpleMovingAverage};
pub use oscillators::{Macd, RelativeStrengthIndex};
pub use returns::RateOfChange;
pub use volatility::BollingerBands;

/// Errors that can occur in indicator calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for trading math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Reject a zero lookback period.
pub(crate) fn ensure_period(period: usize) -> Result<()> {
    if period == 0 {
        return Err(MathError::InvalidInput(
            "Period must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_period_is_rejected() {
        assert!(matches!(ensure_period(0), Err(MathError::InvalidInput(_))));
        assert!(ensure_period(1).is_ok());
    }
}
