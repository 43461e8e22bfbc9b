//! Whole-column indicator adapters
//!
//! Each function feeds a full price column through the matching streaming
//! indicator and returns one entry per input row. Rows that fall inside the
//! indicator's warm-up are `None`; everything after is `Some`.

use crate::moving_averages::{ExponentialMovingAverage, SimpleMovingAverage};
use crate::oscillators::{Macd, RelativeStrengthIndex};
use crate::returns::RateOfChange;
use crate::volatility::BollingerBands;
use crate::{MathError, Result};

/// A column with undefined warm-up rows
pub type Column = Vec<Option<f64>>;

/// MACD line and signal line columns
#[derive(Debug, Clone, PartialEq)]
pub struct MacdColumns {
    pub line: Column,
    pub signal: Column,
}

/// Bollinger upper band, lower band and width columns
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerColumns {
    pub upper: Column,
    pub lower: Column,
    pub width: Column,
}

fn drive<S>(
    values: &[f64],
    mut state: S,
    mut update: impl FnMut(&mut S, f64) -> Result<()>,
    read: impl Fn(&S) -> Result<f64>,
) -> Result<Column> {
    let mut out = Vec::with_capacity(values.len());
    for &value in values {
        update(&mut state, value)?;
        match read(&state) {
            Ok(v) => out.push(Some(v)),
            Err(MathError::InsufficientData(_)) => out.push(None),
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}

/// Simple moving average column
pub fn sma(values: &[f64], period: usize) -> Result<Column> {
    drive(
        values,
        SimpleMovingAverage::new(period)?,
        |s, v| {
            s.update(v);
            Ok(())
        },
        SimpleMovingAverage::value,
    )
}

/// Adjusted exponential moving average column (defined from the first row)
pub fn ema(values: &[f64], span: usize) -> Result<Column> {
    drive(
        values,
        ExponentialMovingAverage::new(span)?,
        |s, v| {
            s.update(v);
            Ok(())
        },
        ExponentialMovingAverage::value,
    )
}

/// Rolling-mean RSI column
pub fn rsi(values: &[f64], period: usize) -> Result<Column> {
    drive(
        values,
        RelativeStrengthIndex::new(period)?,
        |s, v| {
            s.update(v);
            Ok(())
        },
        RelativeStrengthIndex::value,
    )
}

/// Fractional change over `periods` rows
pub fn pct_change(values: &[f64], periods: usize) -> Result<Column> {
    drive(
        values,
        RateOfChange::new(periods)?,
        |s, v| {
            s.update(v);
            Ok(())
        },
        RateOfChange::value,
    )
}

/// MACD line and signal line columns
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> Result<MacdColumns> {
    let mut indicator = Macd::new(fast, slow, signal)?;
    let mut line = Vec::with_capacity(values.len());
    let mut signal_line = Vec::with_capacity(values.len());

    for &value in values {
        indicator.update(value)?;
        line.push(indicator.macd_value().ok());
        signal_line.push(indicator.signal_value().ok());
    }

    Ok(MacdColumns {
        line,
        signal: signal_line,
    })
}

/// Bollinger band columns
pub fn bollinger(values: &[f64], period: usize, std_dev_multiplier: f64) -> Result<BollingerColumns> {
    let mut bands = BollingerBands::new(period, std_dev_multiplier)?;
    let mut upper = Vec::with_capacity(values.len());
    let mut lower = Vec::with_capacity(values.len());
    let mut width = Vec::with_capacity(values.len());

    for &value in values {
        bands.update(value);
        upper.push(bands.upper_band().ok());
        lower.push(bands.lower_band().ok());
        width.push(bands.band_width().ok());
    }

    Ok(BollingerColumns {
        upper,
        lower,
        width,
    })
}

/// Index of the first row at which every column is defined
pub fn first_complete_row(columns: &[&Column]) -> Option<usize> {
    let len = columns.iter().map(|c| c.len()).min()?;
    (0..len).find(|&row| columns.iter().all(|c| c[row].is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1).collect()
    }

    #[test]
    fn warm_up_boundaries() {
        let prices = ramp(80);

        let sma50 = sma(&prices, 50).unwrap();
        assert!(sma50[48].is_none());
        assert!(sma50[49].is_some());

        let rsi14 = rsi(&prices, 14).unwrap();
        assert!(rsi14[13].is_none());
        assert!(rsi14[14].is_some());

        let ret10 = pct_change(&prices, 10).unwrap();
        assert!(ret10[9].is_none());
        assert!(ret10[10].is_some());

        let bands = bollinger(&prices, 20, 2.0).unwrap();
        assert!(bands.upper[18].is_none());
        assert!(bands.width[19].is_some());

        let ema12 = ema(&prices, 12).unwrap();
        assert!(ema12.iter().all(Option::is_some));

        let m = macd(&prices, 12, 26, 9).unwrap();
        assert!(m.line.iter().all(Option::is_some));
        assert!(m.signal.iter().all(Option::is_some));
    }

    #[test]
    fn first_complete_row_is_longest_lookback() {
        let prices = ramp(80);
        let a = sma(&prices, 20).unwrap();
        let b = sma(&prices, 50).unwrap();
        let c = rsi(&prices, 14).unwrap();
        assert_eq!(first_complete_row(&[&a, &b, &c]), Some(49));
    }

    #[test]
    fn rsi_column_is_bounded() {
        let prices = ramp(200);
        for value in rsi(&prices, 14).unwrap().into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value));
        }
    }
}
