//! End-to-end forecast pipeline
//!
//! One call runs fetch → features → scale → window → train → infer → format
//! synchronously. Nothing is cached between calls: every request trains a
//! fresh model on the device held by the service.

use crate::config::{device_label, ForecastConfig};
use crate::error::{ForecastError, Result};
use crate::features::FeatureBuilder;
use crate::metrics::{evaluate_horizons, ForecastMetrics};
use crate::models::{build_model, ForecastModel, ModelShape};
use crate::observer::{NoopObserver, PipelineObserver, PipelineStage};
use crate::scaler::MinMaxScaler;
use crate::signal::TradeSignal;
use crate::trainer::{Trainer, TrainingReport};
use crate::utils::{date_label, forecast_dates, pct_move, round2};
use crate::windows::{batch_of_one, SequenceWindower, WindowSet};
use candle_core::Device;
use market_data::{validate_series, Lookback, MarketDataProvider, ProviderError};
use ndarray::{s, Array1};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One forecast day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: String,
    pub predicted: f64,
}

/// One observed day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: String,
    pub price: f64,
}

/// A successful forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub symbol: String,
    pub current_price: f64,
    /// Price on the last forecast day
    pub target_price: f64,
    pub delta_pct: f64,
    pub signal: TradeSignal,
    pub forecast: Vec<ForecastPoint>,
    pub history: Vec<HistoryPoint>,
    pub pred_days: usize,
}

/// Either a forecast or the message of the stage that failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForecastResponse {
    Forecast(ForecastResult),
    Error { error: String },
}

impl ForecastResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, ForecastResponse::Error { .. })
    }
}

impl From<Result<ForecastResult>> for ForecastResponse {
    fn from(result: Result<ForecastResult>) -> Self {
        match result {
            Ok(forecast) => ForecastResponse::Forecast(forecast),
            Err(e) => ForecastResponse::Error {
                error: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub device: String,
}

/// Time spent in one stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageTiming {
    pub stage: PipelineStage,
    pub elapsed: Duration,
}

/// Diagnostics gathered alongside a forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub stages: Vec<StageTiming>,
    pub bars: usize,
    pub feature_rows: usize,
    pub windows: usize,
    pub training: TrainingReport,
    /// Price-scale accuracy on the held-out windows
    pub eval_metrics: Option<ForecastMetrics>,
}

impl PipelineReport {
    pub fn total_elapsed(&self) -> Duration {
        self.stages.iter().map(|s| s.elapsed).sum()
    }

    pub fn elapsed(&self, stage: PipelineStage) -> Option<Duration> {
        self.stages.iter().find(|s| s.stage == stage).map(|s| s.elapsed)
    }
}

/// Reports each stage to the observer as it finishes
struct StageClock<'a> {
    observer: &'a dyn PipelineObserver,
    started: Instant,
    timings: Vec<StageTiming>,
}

impl<'a> StageClock<'a> {
    fn new(observer: &'a dyn PipelineObserver) -> Self {
        Self {
            observer,
            started: Instant::now(),
            timings: Vec::with_capacity(PipelineStage::ALL.len()),
        }
    }

    fn lap(&mut self, stage: PipelineStage) {
        let elapsed = self.started.elapsed();
        self.observer.stage_completed(stage, elapsed);
        debug!(%stage, elapsed_ms = elapsed.as_millis() as u64, "stage complete");
        self.timings.push(StageTiming { stage, elapsed });
        self.started = Instant::now();
    }
}

/// Produces forecasts for symbols served by `P`
pub struct ForecastService<P> {
    provider: P,
    config: ForecastConfig,
    device: Device,
    observer: Arc<dyn PipelineObserver>,
}

impl<P: MarketDataProvider> ForecastService<P> {
    /// Validate `config` and open the device it names
    pub fn new(provider: P, config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        let device = config.device.resolve()?;
        Self::with_device(provider, config, device)
    }

    /// Use an already opened device; `config.device` is ignored
    pub fn with_device(provider: P, config: ForecastConfig, device: Device) -> Result<Self> {
        config.validate()?;
        info!(device = device_label(&device), "forecast service ready");
        Ok(Self {
            provider,
            config,
            device,
            observer: Arc::new(NoopObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            device: device_label(&self.device).to_string(),
        }
    }

    pub fn forecast(&self, symbol: &str) -> Result<ForecastResult> {
        self.forecast_with_report(symbol).map(|(result, _)| result)
    }

    /// Forecast and return per-stage diagnostics with it
    pub fn forecast_with_report(&self, symbol: &str) -> Result<(ForecastResult, PipelineReport)> {
        let symbol = normalize_symbol(symbol)?;
        self.run(&symbol).map_err(|e| {
            warn!(symbol = %symbol, error = %e, "forecast failed");
            e
        })
    }

    /// Never fails: errors become `{"error": ...}`
    pub fn respond(&self, symbol: &str) -> ForecastResponse {
        self.forecast(symbol).into()
    }

    fn run(&self, symbol: &str) -> Result<(ForecastResult, PipelineReport)> {
        let cfg = &self.config;
        let mut clock = StageClock::new(self.observer.as_ref());
        info!(symbol, provider = self.provider.name(), "forecast requested");

        let bars = self.provider.history(symbol, Lookback::days(cfg.lookback_days))?;
        if bars.is_empty() {
            return Err(ProviderError::Empty(symbol.to_string()).into());
        }
        validate_series(symbol, &bars)?;
        clock.lap(PipelineStage::Fetch);

        let table = FeatureBuilder::new(cfg.min_rows()).build(&bars)?;
        clock.lap(PipelineStage::Features);

        // Both scalers see the whole history, held-out windows included
        let feature_scaler = MinMaxScaler::fit(table.values())?;
        let scaled = feature_scaler.transform(table.values())?;
        let target_scaler = MinMaxScaler::fit_column(table.close())?;
        let scaled_target = target_scaler.transform_column(table.close())?;
        clock.lap(PipelineStage::Scale);

        let windows = SequenceWindower::new(cfg.seq_len, cfg.pred_days)?
            .windows(scaled.view(), scaled_target.view())?;
        let (train, eval) = windows.split(cfg.train_fraction);
        clock.lap(PipelineStage::Window);

        let shape = ModelShape::from_config(cfg, table.columns().len());
        let (varmap, model) = build_model(shape, &self.device)?;
        let training = Trainer::new(cfg).fit(&model, &varmap, &train, &eval, &self.device, self.observer.as_ref())?;
        clock.lap(PipelineStage::Train);

        let recent = scaled.slice(s![scaled.nrows() - cfg.seq_len.., ..]);
        let scaled_forecast = model.predict(&batch_of_one(recent, &self.device)?)?.squeeze(0)?.to_vec1::<f32>()?;
        if scaled_forecast.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::Numeric("model produced a non-finite forecast".to_string()));
        }
        let scaled_forecast: Array1<f64> = scaled_forecast.into_iter().map(f64::from).collect();
        let prices = target_scaler.inverse_column(scaled_forecast.view())?;
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(ForecastError::Numeric("forecast prices are not finite".to_string()));
        }
        let eval_metrics = self.evaluate(&model, &eval, &target_scaler)?;
        clock.lap(PipelineStage::Infer);

        let last = table.len() - 1;
        let current_price = table.close()[last];
        let target_price = prices[prices.len() - 1];
        let delta_pct = forecast_move(current_price, target_price)?;
        let signal = TradeSignal::classify(delta_pct);

        let forecast = forecast_dates(table.dates()[last], cfg.pred_days)
            .into_iter()
            .zip(prices.iter())
            .map(|(date, &price)| ForecastPoint {
                date: date_label(date),
                predicted: round2(price),
            })
            .collect();
        let recent_rows = table.tail(cfg.seq_len);
        let history = recent_rows
            .dates()
            .iter()
            .zip(recent_rows.close().iter())
            .map(|(&date, &price)| HistoryPoint {
                date: date_label(date),
                price: round2(price),
            })
            .collect();

        let result = ForecastResult {
            symbol: symbol.to_string(),
            current_price: round2(current_price),
            target_price: round2(target_price),
            delta_pct: round2(delta_pct),
            signal,
            forecast,
            history,
            pred_days: cfg.pred_days,
        };
        clock.lap(PipelineStage::Format);

        info!(
            symbol,
            current = result.current_price,
            target = result.target_price,
            delta_pct = result.delta_pct,
            signal = %result.signal,
            "forecast complete"
        );

        let report = PipelineReport {
            stages: clock.timings,
            bars: bars.len(),
            feature_rows: table.len(),
            windows: windows.len(),
            training,
            eval_metrics,
        };
        Ok((result, report))
    }

    /// Score the held-out windows on the price scale
    fn evaluate(
        &self,
        model: &ForecastModel,
        eval: &WindowSet,
        target_scaler: &MinMaxScaler,
    ) -> Result<Option<ForecastMetrics>> {
        if eval.is_empty() {
            return Ok(None);
        }
        let preds = model.predict(&eval.inputs_tensor(&self.device)?)?;
        let preds: Array1<f64> = preds.flatten_all()?.to_vec1::<f32>()?.into_iter().map(f64::from).collect();
        let actual: Array1<f64> = eval.targets().iter().map(|&v| f64::from(v)).collect();

        let preds = target_scaler.inverse_column(preds.view())?;
        let actual = target_scaler.inverse_column(actual.view())?;
        evaluate_horizons(&preds.to_vec(), &actual.to_vec(), self.config.pred_days).map(Some)
    }
}

/// Percent move from the last close to the final forecast day
fn forecast_move(current_price: f64, target_price: f64) -> Result<f64> {
    let delta_pct = pct_move(current_price, target_price);
    if !delta_pct.is_finite() {
        return Err(ForecastError::Numeric(format!(
            "move from {current_price} to {target_price} is not a finite percentage"
        )));
    }
    Ok(delta_pct)
}

/// Trim and upper-case a ticker
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(ForecastError::InvalidParameter("symbol must not be empty".to_string()));
    }
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("  aapl ").unwrap(), "AAPL");
        assert!(matches!(normalize_symbol("   "), Err(ForecastError::InvalidParameter(_))));
    }

    #[test]
    fn test_forecast_move_rejects_non_finite() {
        assert_eq!(forecast_move(100.0, 103.0).unwrap(), 3.0);
        assert!(matches!(forecast_move(0.0, 4.78), Err(ForecastError::Numeric(_))));
        assert!(matches!(forecast_move(100.0, f64::NAN), Err(ForecastError::Numeric(_))));
    }

    #[test]
    fn test_error_response_shape() {
        let response = ForecastResponse::from(Err::<ForecastResult, _>(ForecastError::Numeric("bad".to_string())));
        assert!(response.is_error());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({ "error": "Numeric error: bad" })
        );
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = ForecastResult {
            symbol: "AAPL".to_string(),
            current_price: 100.0,
            target_price: 103.5,
            delta_pct: 3.5,
            signal: TradeSignal::Buy,
            forecast: vec![ForecastPoint {
                date: "Jan 05".to_string(),
                predicted: 103.5,
            }],
            history: vec![HistoryPoint {
                date: "Jan 04".to_string(),
                price: 100.0,
            }],
            pred_days: 1,
        };
        let value = serde_json::to_value(ForecastResponse::Forecast(result)).unwrap();

        assert_eq!(value["currentPrice"], 100.0);
        assert_eq!(value["targetPrice"], 103.5);
        assert_eq!(value["deltaPct"], 3.5);
        assert_eq!(value["signal"], "BUY");
        assert_eq!(value["predDays"], 1);
        assert_eq!(value["forecast"][0]["predicted"], 103.5);
        assert_eq!(value["history"][0]["price"], 100.0);
        assert!(value.get("error").is_none());
    }
}
