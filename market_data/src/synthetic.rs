//! Deterministic synthetic price history
//!
//! Prices follow a geometric Brownian motion sampled on business days. The
//! random stream is seeded from the symbol so the same symbol always yields
//! the same series.

use crate::calendar::{business_days_between, next_business_day};
use crate::{Lookback, MarketDataProvider, PriceBar, Result};
use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Generate `count` business-day bars starting on the first business day on
/// or after `start`.
///
/// # Arguments
/// * `seed` - Seed for the random stream
/// * `start` - First candidate date
/// * `count` - Number of bars to generate
/// * `starting_price` - Open price of the first bar
/// * `volatility` - Daily log-return standard deviation
pub fn generate_bars(
    seed: u64,
    start: NaiveDate,
    count: usize,
    starting_price: f64,
    volatility: f64,
) -> Vec<PriceBar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let drift = 0.0003;

    let first = start.pred_opt().map(next_business_day).unwrap_or(start);
    let mut date = first;
    let mut close = starting_price;
    let mut data = Vec::with_capacity(count);

    for i in 0..count {
        if i > 0 {
            date = next_business_day(date);
        }

        let open = close;
        let z: f64 = rng.sample(StandardNormal);
        close = open * ((drift - 0.5 * volatility * volatility) + volatility * z).exp();

        // High and low extend past the open/close body by a random fraction
        let high = open.max(close) * (1.0 + rng.gen::<f64>() * volatility * 0.5);
        let low = open.min(close) * (1.0 - rng.gen::<f64>() * volatility * 0.5);
        let volume = rng.gen_range(1_000_000..5_000_000);

        data.push(PriceBar::new(date, open, high, low, close, volume));
    }

    data
}

/// FNV-1a hash, stable across platforms and releases
fn symbol_seed(symbol: &str) -> u64 {
    symbol
        .to_uppercase()
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        })
}

/// Generates a reproducible random walk for any symbol
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    end: NaiveDate,
    starting_price: f64,
    volatility: f64,
}

impl SyntheticProvider {
    pub fn new(end: NaiveDate, starting_price: f64, volatility: f64) -> Self {
        Self {
            end,
            starting_price,
            volatility,
        }
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(Utc::now().date_naive(), 100.0, 0.02)
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn history(&self, symbol: &str, lookback: Lookback) -> Result<Vec<PriceBar>> {
        let days = business_days_between(lookback.start_for(self.end), self.end);
        let Some(&first) = days.first() else {
            return Ok(Vec::new());
        };

        Ok(generate_bars(
            symbol_seed(symbol),
            first,
            days.len(),
            self.starting_price,
            self.volatility,
        ))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
