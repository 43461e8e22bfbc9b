//! Oscillator indicator implementations
//!
//! Contains implementations of:
//! - Relative Strength Index (RSI), rolling-mean variant
//! - Moving Average Convergence Divergence (MACD)

use crate::moving_averages::{ExponentialMovingAverage, SimpleMovingAverage};
use crate::{MathError, Result};

/// Guard added to the average loss so a loss-free window stays finite.
pub const RSI_EPSILON: f64 = 1e-9;

/// Relative Strength Index (RSI) implementation
///
/// Average gain and average loss are plain rolling means of the positive and
/// negative price deltas over `period` deltas. The first value therefore
/// needs `period + 1` prices.
#[derive(Debug, Clone)]
pub struct RelativeStrengthIndex {
    period: usize,
    previous_price: Option<f64>,
    gains: SimpleMovingAverage,
    losses: SimpleMovingAverage,
}

impl RelativeStrengthIndex {
    /// Create a new RSI with the specified period
    pub fn new(period: usize) -> Result<Self> {
        Ok(Self {
            period,
            previous_price: None,
            gains: SimpleMovingAverage::new(period)?,
            losses: SimpleMovingAverage::new(period)?,
        })
    }

    /// Update the RSI with a new price value
    pub fn update(&mut self, price: f64) {
        if let Some(prev_price) = self.previous_price {
            let change = price - prev_price;
            self.gains.update(change.max(0.0));
            self.losses.update((-change).max(0.0));
        }

        self.previous_price = Some(price);
    }

    /// Get the current RSI value (0-100)
    pub fn value(&self) -> Result<f64> {
        if !self.gains.is_ready() {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for RSI calculation. Need {} prices.",
                self.period + 1
            )));
        }

        let avg_gain = self.gains.value()?;
        let avg_loss = self.losses.value()?;
        let rs = avg_gain / (avg_loss + RSI_EPSILON);

        Ok(100.0 - (100.0 / (1.0 + rs)))
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the RSI, clearing all values
    pub fn reset(&mut self) {
        self.previous_price = None;
        self.gains.reset();
        self.losses.reset();
    }
}

/// Moving Average Convergence Divergence (MACD) implementation
///
/// The MACD line is `EMA(fast) - EMA(slow)` and the signal line is the
/// `signal`-span EMA of the MACD line. With adjusted EMAs both lines are
/// defined from the first price.
#[derive(Debug, Clone)]
pub struct Macd {
    fast_ema: ExponentialMovingAverage,
    slow_ema: ExponentialMovingAverage,
    signal_ema: ExponentialMovingAverage,
}

impl Macd {
    /// Create a new MACD with the specified spans
    pub fn new(fast_span: usize, slow_span: usize, signal_span: usize) -> Result<Self> {
        if fast_span >= slow_span {
            return Err(MathError::InvalidInput(
                "Fast span must be smaller than slow span".to_string(),
            ));
        }

        Ok(Self {
            fast_ema: ExponentialMovingAverage::new(fast_span)?,
            slow_ema: ExponentialMovingAverage::new(slow_span)?,
            signal_ema: ExponentialMovingAverage::new(signal_span)?,
        })
    }

    /// Update the MACD with a new price value
    pub fn update(&mut self, price: f64) -> Result<()> {
        self.fast_ema.update(price);
        self.slow_ema.update(price);

        let macd_value = self.macd_value()?;
        self.signal_ema.update(macd_value);

        Ok(())
    }

    /// Get the current MACD line value (fast EMA - slow EMA)
    pub fn macd_value(&self) -> Result<f64> {
        Ok(self.fast_ema.value()? - self.slow_ema.value()?)
    }

    /// Get the current signal line value (EMA of MACD)
    pub fn signal_value(&self) -> Result<f64> {
        self.signal_ema.value().map_err(|_| {
            MathError::InsufficientData("Not enough data to calculate signal line".to_string())
        })
    }

    /// Get the current histogram value (MACD line - signal line)
    pub fn histogram(&self) -> Result<f64> {
        Ok(self.macd_value()? - self.signal_value()?)
    }

    /// Reset the MACD, clearing all values
    pub fn reset(&mut self) {
        self.fast_ema.reset();
        self.slow_ema.reset();
        self.signal_ema.reset();
    }
}
