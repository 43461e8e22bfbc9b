//! `quantdesk` command definitions
//!
//! Configuration comes from a JSON file (or the built-in defaults) and is
//! then overridden by flags:
//!
//! ```bash
//! quantdesk forecast AAPL --data-dir ./bars --epochs 20 --device cpu
//! quantdesk forecast NVDA --synthetic --report
//! quantdesk health
//! ```

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use forecast_trade::{DeviceKind, ForecastConfig, ForecastResponse, ForecastService};
use market_data::{CsvDirectoryProvider, InMemoryProvider, MarketDataProvider, SyntheticProvider};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "quantdesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a fresh model on a symbol's history and print its forecast
    Forecast(ForecastCommand),

    /// Report service status and the compute device
    Health(HealthCommand),
}

fn parse_device(s: &str) -> std::result::Result<DeviceKind, String> {
    s.parse().map_err(|e: forecast_trade::ForecastError| e.to_string())
}

/// Settings shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a JSON configuration file
    #[arg(long, short = 'c', env = "QUANTDESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Compute device: cpu, cuda or auto
    #[arg(long, env = "QUANTDESK_DEVICE", value_parser = parse_device)]
    pub device: Option<DeviceKind>,
}

impl ConfigArgs {
    /// File (or default) config with the device flag applied
    pub fn load(&self) -> Result<ForecastConfig> {
        let mut config = match &self.config {
            Some(path) => ForecastConfig::from_json_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => ForecastConfig::default(),
        };
        if let Some(device) = self.device {
            config.device = device;
        }
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ForecastCommand {
    /// Ticker symbol to forecast
    pub symbol: String,

    /// Directory holding one `<SYMBOL>.csv` file per symbol
    #[arg(long, short = 'd', env = "QUANTDESK_DATA_DIR", conflicts_with = "synthetic")]
    pub data_dir: Option<PathBuf>,

    /// Use a seeded random walk instead of real data
    #[arg(long)]
    pub synthetic: bool,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override the number of training epochs
    #[arg(long, short = 'e')]
    pub epochs: Option<usize>,

    /// Also write stage timings and training losses to stderr
    #[arg(long)]
    pub report: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl ForecastCommand {
    /// Effective configuration after all overrides
    pub fn build_config(&self) -> Result<ForecastConfig> {
        let mut config = self.config.load()?;
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        config.validate()?;
        Ok(config)
    }

    fn provider(&self) -> Result<Arc<dyn MarketDataProvider>> {
        match (&self.data_dir, self.synthetic) {
            (_, true) => Ok(Arc::new(SyntheticProvider::default())),
            (Some(dir), false) => Ok(Arc::new(CsvDirectoryProvider::new(dir))),
            (None, false) => bail!("pass --data-dir DIR or --synthetic to choose a data source"),
        }
    }

    pub fn run(&self) -> Result<ExitCode> {
        let config = self.build_config()?;
        let provider = self.provider()?;
        info!(symbol = %self.symbol, provider = provider.name(), epochs = config.epochs, "running forecast");

        let service = ForecastService::new(provider, config)?;
        let response = if self.report {
            match service.forecast_with_report(&self.symbol) {
                Ok((result, report)) => {
                    eprintln!("{}", serde_json::to_string_pretty(&report)?);
                    ForecastResponse::Forecast(result)
                }
                Err(e) => ForecastResponse::Error {
                    error: e.to_string(),
                },
            }
        } else {
            service.respond(&self.symbol)
        };

        println!("{}", to_json(&response, self.pretty)?);
        Ok(if response.is_error() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        })
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct HealthCommand {
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl HealthCommand {
    pub fn run(&self) -> Result<ExitCode> {
        let service = ForecastService::new(InMemoryProvider::new(), self.config.load()?)?;
        println!("{}", serde_json::to_string(&service.health())?);
        Ok(ExitCode::SUCCESS)
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
