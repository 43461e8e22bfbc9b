//! Pipeline configuration

use crate::error::{ForecastError, Result};
use candle_core::Device;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Which compute device the service should hold for its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Cpu,
    Cuda,
    /// CUDA when compiled in and present, CPU otherwise
    #[default]
    Auto,
}

impl DeviceKind {
    /// Open the device. Asking for CUDA on a build without it is an error.
    pub fn resolve(self) -> Result<Device> {
        let device = match self {
            DeviceKind::Cpu => Device::Cpu,
            DeviceKind::Cuda => Device::new_cuda(0)?,
            DeviceKind::Auto => Device::cuda_if_available(0)?,
        };
        Ok(device)
    }
}

impl FromStr for DeviceKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(DeviceKind::Cpu),
            "cuda" | "gpu" => Ok(DeviceKind::Cuda),
            "auto" => Ok(DeviceKind::Auto),
            other => Err(ForecastError::Config(format!("unknown device '{other}'"))),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeviceKind::Cpu => "cpu",
            DeviceKind::Cuda => "cuda",
            DeviceKind::Auto => "auto",
        };
        f.write_str(label)
    }
}

/// Short label for a resolved device
pub fn device_label(device: &Device) -> &'static str {
    if device.is_cuda() {
        "cuda"
    } else if device.is_metal() {
        "metal"
    } else {
        "cpu"
    }
}

/// Every tunable of a forecast request
///
/// Missing keys in a JSON file fall back to [`ForecastConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Input window length in trading days
    pub seq_len: usize,
    /// Forecast horizon in trading days
    pub pred_days: usize,
    /// Extra feature rows required beyond one window plus its target
    pub min_buffer: usize,

    pub d_model: usize,
    pub n_heads: usize,
    pub n_layers: usize,
    pub dropout: f64,

    pub epochs: usize,
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub huber_delta: f64,
    pub grad_clip: f64,
    /// Leading share of windows used for training
    pub train_fraction: f64,
    /// Mini-batch size; `None` trains on the whole split in one step per epoch
    pub batch_size: Option<usize>,
    pub log_every: usize,

    /// Calendar days of history requested from the provider
    pub lookback_days: u32,
    pub device: DeviceKind,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            seq_len: 60,
            pred_days: 14,
            min_buffer: 60,

            d_model: 64,
            n_heads: 4,
            n_layers: 2,
            dropout: 0.1,

            epochs: 40,
            learning_rate: 1e-3,
            weight_decay: 1e-4,
            huber_delta: 1.0,
            grad_clip: 1.0,
            train_fraction: 0.85,
            batch_size: None,
            log_every: 20,

            lookback_days: 730,
            device: DeviceKind::Auto,
        }
    }
}

impl ForecastConfig {
    /// Load a config from a JSON file and validate it
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Fewest feature rows a request may have
    pub fn min_rows(&self) -> usize {
        self.seq_len + self.pred_days + self.min_buffer
    }

    /// Feed-forward width inside each encoder block
    pub fn ff_dim(&self) -> usize {
        self.d_model * 4
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("seq_len", self.seq_len),
            ("pred_days", self.pred_days),
            ("d_model", self.d_model),
            ("n_heads", self.n_heads),
            ("n_layers", self.n_layers),
            ("epochs", self.epochs),
            ("log_every", self.log_every),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ForecastError::Config(format!("{name} must be greater than zero")));
        }

        if self.d_model % self.n_heads != 0 {
            return Err(ForecastError::Config(format!(
                "d_model ({}) must be divisible by n_heads ({})",
                self.d_model, self.n_heads
            )));
        }
        if self.d_model < 2 || self.d_model % 2 != 0 {
            return Err(ForecastError::Config(format!(
                "d_model ({}) must be even for the positional encoding",
                self.d_model
            )));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ForecastError::Config(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction <= 1.0) {
            return Err(ForecastError::Config(format!(
                "train_fraction must be in (0, 1], got {}",
                self.train_fraction
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ForecastError::Config("learning_rate must be positive".to_string()));
        }
        if !(self.huber_delta.is_finite() && self.huber_delta > 0.0) {
            return Err(ForecastError::Config("huber_delta must be positive".to_string()));
        }
        if !(self.grad_clip.is_finite() && self.grad_clip > 0.0) {
            return Err(ForecastError::Config("grad_clip must be positive".to_string()));
        }
        if self.weight_decay < 0.0 {
            return Err(ForecastError::Config("weight_decay must not be negative".to_string()));
        }
        if self.batch_size == Some(0) {
            return Err(ForecastError::Config("batch_size must be greater than zero".to_string()));
        }
        if self.lookback_days == 0 {
            return Err(ForecastError::Config("lookback_days must be greater than zero".to_string()));
        }
        Ok(())
    }
}
