//! Accuracy metrics for held-out forecasts

use crate::error::{ForecastError, Result};
use serde::Serialize;
use statrs::statistics::Statistics;

/// Compare forecast values with what actually happened
pub fn evaluate_forecast(forecast: &[f64], actual: &[f64]) -> Result<ForecastMetrics> {
    evaluate_horizons(forecast, actual, forecast.len().max(1))
}

/// Like [`evaluate_forecast`] for several forecasts laid end to end, each
/// `horizon` values long
///
/// Direction is only scored between consecutive days of the same forecast,
/// never across the boundary between two of them.
pub fn evaluate_horizons(forecast: &[f64], actual: &[f64], horizon: usize) -> Result<ForecastMetrics> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }
    if horizon == 0 || forecast.len() % horizon != 0 {
        return Err(ForecastError::InvalidParameter(format!(
            "{} values do not split into forecasts of {horizon}",
            forecast.len()
        )));
    }

    let n = forecast.len() as f64;
    let errors: Vec<f64> = forecast.iter().zip(actual).map(|(&f, &a)| a - f).collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;

    let mape = actual
        .iter()
        .zip(&errors)
        .filter(|(&a, _)| a != 0.0)
        .map(|(&a, &e)| (e.abs() / a.abs()) * 100.0)
        .sum::<f64>()
        / n;

    let smape = actual
        .iter()
        .zip(forecast)
        .map(|(&a, &f)| {
            let denom = a.abs() + f.abs();
            if denom == 0.0 {
                0.0
            } else {
                200.0 * (a - f).abs() / denom
            }
        })
        .sum::<f64>()
        / n;

    // Sample standard deviation; a single point has none
    let error_std = if errors.len() > 1 { errors.iter().std_dev() } else { 0.0 };

    Ok(ForecastMetrics {
        mae,
        mse,
        rmse: mse.sqrt(),
        mape,
        smape,
        error_std,
        direction_accuracy: direction_accuracy(forecast, actual, horizon),
    })
}

/// Share of steps where forecast and actual moved the same way, in percent
fn direction_accuracy(forecast: &[f64], actual: &[f64], horizon: usize) -> f64 {
    let moves: Vec<bool> = forecast
        .chunks(horizon)
        .zip(actual.chunks(horizon))
        .flat_map(|(f, a)| f.windows(2).zip(a.windows(2)))
        .filter(|(f, a)| (f[1] - f[0]).abs() > 1e-10 && (a[1] - a[0]).abs() > 1e-10)
        .map(|(f, a)| (f[1] > f[0]) == (a[1] > a[0]))
        .collect();

    if moves.is_empty() {
        return 0.0;
    }
    moves.iter().filter(|&&hit| hit).count() as f64 / moves.len() as f64 * 100.0
}

/// Forecast performance metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error
    pub mape: f64,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
    /// Sample standard deviation of the errors
    pub error_std: f64,
    /// Direction accuracy percentage
    pub direction_accuracy: f64,
}

impl std::fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Performance Metrics:")?;
        writeln!(f, "  MAE:       {:.4}", self.mae)?;
        writeln!(f, "  MSE:       {:.4}", self.mse)?;
        writeln!(f, "  RMSE:      {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:      {:.4}%", self.mape)?;
        writeln!(f, "  SMAPE:     {:.4}%", self.smape)?;
        writeln!(f, "  Error std: {:.4}", self.error_std)?;
        writeln!(f, "  Direction: {:.2}%", self.direction_accuracy)?;
        Ok(())
    }
}
