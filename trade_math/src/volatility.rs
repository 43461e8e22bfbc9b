//! Volatility indicator implementations
//!
//! Contains the Bollinger Bands indicator, computed with the sample
//! (n - 1) standard deviation of the trailing window.

use crate::moving_averages::SimpleMovingAverage;
use crate::{MathError, Result};

/// Bollinger Bands implementation
#[derive(Debug, Clone)]
pub struct BollingerBands {
    std_dev_multiplier: f64,
    sma: SimpleMovingAverage,
}

impl BollingerBands {
    /// Create a new Bollinger Bands with the specified parameters
    pub fn new(period: usize, std_dev_multiplier: f64) -> Result<Self> {
        if period < 2 {
            return Err(MathError::InvalidInput(
                "Bollinger period must be at least 2 for a sample standard deviation".to_string(),
            ));
        }
        if std_dev_multiplier <= 0.0 {
            return Err(MathError::InvalidInput(
                "Standard deviation multiplier must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            std_dev_multiplier,
            sma: SimpleMovingAverage::new(period)?,
        })
    }

    /// Update the Bollinger Bands with a new price value
    pub fn update(&mut self, price: f64) {
        self.sma.update(price);
    }

    /// Get the current middle band (SMA)
    pub fn middle_band(&self) -> Result<f64> {
        self.sma.value()
    }

    /// Sample standard deviation of the prices in the window
    pub fn std_dev(&self) -> Result<f64> {
        let mean = self.sma.value()?;
        let n = self.sma.period() as f64;

        let sum_sq: f64 = self
            .sma
            .window()
            .map(|&price| {
                let diff = price - mean;
                diff * diff
            })
            .sum();

        Ok((sum_sq / (n - 1.0)).sqrt())
    }

    /// Get the current upper band (SMA + multiplier * std_dev)
    pub fn upper_band(&self) -> Result<f64> {
        Ok(self.middle_band()? + self.std_dev()? * self.std_dev_multiplier)
    }

    /// Get the current lower band (SMA - multiplier * std_dev)
    pub fn lower_band(&self) -> Result<f64> {
        Ok(self.middle_band()? - self.std_dev()? * self.std_dev_multiplier)
    }

    /// Absolute distance between the upper and lower band
    pub fn band_width(&self) -> Result<f64> {
        Ok(self.upper_band()? - self.lower_band()?)
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.sma.period()
    }

    /// Get the standard deviation multiplier
    pub fn std_dev_multiplier(&self) -> f64 {
        self.std_dev_multiplier
    }

    /// Reset the Bollinger Bands, clearing all values
    pub fn reset(&mut self) {
        self.sma.reset();
    }
}
