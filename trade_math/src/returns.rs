//! Rate-of-change over a fixed number of periods

use crate::{ensure_period, MathError, Result};
use std::collections::VecDeque;

/// Fractional change `price_t / price_(t - periods) - 1`
#[derive(Debug, Clone)]
pub struct RateOfChange {
    periods: usize,
    prices: VecDeque<f64>,
}

impl RateOfChange {
    /// Create a rate-of-change tracker over `periods` observations
    pub fn new(periods: usize) -> Result<Self> {
        ensure_period(periods)?;

        Ok(Self {
            periods,
            prices: VecDeque::with_capacity(periods + 1),
        })
    }

    /// Push a new price
    pub fn update(&mut self, price: f64) {
        self.prices.push_back(price);
        if self.prices.len() > self.periods + 1 {
            self.prices.pop_front();
        }
    }

    /// Current fractional change. A zero base price yields an infinite value,
    /// which callers are expected to reject.
    pub fn value(&self) -> Result<f64> {
        match (self.prices.front(), self.prices.back()) {
            (Some(&base), Some(&last)) if self.prices.len() == self.periods + 1 => {
                Ok(last / base - 1.0)
            }
            _ => Err(MathError::InsufficientData(format!(
                "Not enough data for a {}-period change. Need {} values, have {}.",
                self.periods,
                self.periods + 1,
                self.prices.len()
            ))),
        }
    }

    /// Number of periods spanned
    pub fn periods(&self) -> usize {
        self.periods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_one_period_change() {
        let mut roc = RateOfChange::new(1).unwrap();
        roc.update(100.0);
        assert!(roc.value().is_err());

        roc.update(110.0);
        assert_relative_eq!(roc.value().unwrap(), 0.1, epsilon = 1e-12);

        roc.update(99.0);
        assert_relative_eq!(roc.value().unwrap(), -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_multi_period_change() {
        let mut roc = RateOfChange::new(5).unwrap();
        for price in [10.0, 11.0, 12.0, 13.0, 14.0, 15.0] {
            roc.update(price);
        }
        assert_relative_eq!(roc.value().unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_base_is_not_finite() {
        let mut roc = RateOfChange::new(1).unwrap();
        roc.update(0.0);
        roc.update(5.0);
        assert!(!roc.value().unwrap().is_finite());
    }
}
