//! Moving average calculation implementations
//!
//! Contains implementations of:
//! - Simple Moving Average (SMA) over a fixed trailing window
//! - Exponential Moving Average (EMA) in its bias-adjusted form

use crate::{ensure_period, MathError, Result};
use std::collections::VecDeque;

/// Simple Moving Average (SMA) implementation
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl SimpleMovingAverage {
    /// Create a new Simple Moving Average with the specified period
    pub fn new(period: usize) -> Result<Self> {
        ensure_period(period)?;

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period + 1),
            sum: 0.0,
        })
    }

    /// Push a new observation, evicting the oldest one once the window is full
    pub fn update(&mut self, value: f64) {
        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.period {
            if let Some(old_value) = self.values.pop_front() {
                self.sum -= old_value;
            }
        }
    }

    /// Whether the window holds a full period of observations
    pub fn is_ready(&self) -> bool {
        self.values.len() == self.period
    }

    /// Get the current SMA value
    pub fn value(&self) -> Result<f64> {
        if !self.is_ready() {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for SMA calculation. Need {} values, have {}.",
                self.period,
                self.values.len()
            )));
        }

        Ok(self.sum / self.period as f64)
    }

    /// Observations currently inside the window, oldest first
    pub fn window(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the SMA, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
        self.sum = 0.0;
    }
}

/// Exponential Moving Average (EMA) implementation
///
/// Uses the bias-adjusted weighting with `alpha = 2 / (span + 1)`:
///
/// ```text
/// ema_t = sum_i (1 - alpha)^(t - i) * x_i / sum_i (1 - alpha)^(t - i)
/// ```
///
/// so a value is available from the very first observation.
#[derive(Debug, Clone)]
pub struct ExponentialMovingAverage {
    span: usize,
    decay: f64,
    weighted_sum: f64,
    weight_total: f64,
}

impl ExponentialMovingAverage {
    /// Create a new Exponential Moving Average with the specified span
    pub fn new(span: usize) -> Result<Self> {
        ensure_period(span)?;

        let alpha = 2.0 / (span as f64 + 1.0);

        Ok(Self {
            span,
            decay: 1.0 - alpha,
            weighted_sum: 0.0,
            weight_total: 0.0,
        })
    }

    /// Update the EMA with a new value
    pub fn update(&mut self, value: f64) {
        self.weighted_sum = value + self.decay * self.weighted_sum;
        self.weight_total = 1.0 + self.decay * self.weight_total;
    }

    /// Get the current EMA value
    pub fn value(&self) -> Result<f64> {
        if self.weight_total == 0.0 {
            return Err(MathError::InsufficientData(
                "EMA has not seen any values yet".to_string(),
            ));
        }

        Ok(self.weighted_sum / self.weight_total)
    }

    /// Smoothing factor `2 / (span + 1)`
    pub fn alpha(&self) -> f64 {
        1.0 - self.decay
    }

    /// Get the current span
    pub fn span(&self) -> usize {
        self.span
    }

    /// Reset the EMA, clearing all values
    pub fn reset(&mut self) {
        self.weighted_sum = 0.0;
        self.weight_total = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sma_calculation() {
        let mut sma = SimpleMovingAverage::new(3).unwrap();

        // Not enough data yet
        assert!(sma.value().is_err());

        sma.update(2.0);
        sma.update(4.0);
        assert!(sma.value().is_err());

        sma.update(6.0);
        assert_eq!(sma.value().unwrap(), 4.0);

        // The window slides, dropping the oldest value
        sma.update(8.0);
        assert_eq!(sma.value().unwrap(), 6.0);
        assert_eq!(sma.window().copied().collect::<Vec<_>>(), vec![4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_ema_first_value_is_the_observation() {
        let mut ema = ExponentialMovingAverage::new(12).unwrap();
        assert!(ema.value().is_err());

        ema.update(10.0);
        assert_eq!(ema.value().unwrap(), 10.0);
    }

    #[test]
    fn test_ema_adjusted_weights() {
        // span 3 -> alpha 0.5, weights 1, 0.5, 0.25 for the newest-to-oldest values
        let mut ema = ExponentialMovingAverage::new(3).unwrap();
        ema.update(2.0);
        ema.update(4.0);
        ema.update(6.0);

        let expected = (6.0 + 0.5 * 4.0 + 0.25 * 2.0) / (1.0 + 0.5 + 0.25);
        assert_relative_eq!(ema.value().unwrap(), expected, epsilon = 1e-12);
        assert_relative_eq!(ema.alpha(), 0.5);
    }

    #[test]
    fn test_ema_of_constant_series_is_constant() {
        let mut ema = ExponentialMovingAverage::new(26).unwrap();
        for _ in 0..100 {
            ema.update(42.0);
        }
        assert_relative_eq!(ema.value().unwrap(), 42.0, epsilon = 1e-9);

        ema.reset();
        assert!(ema.value().is_err());
    }
}
