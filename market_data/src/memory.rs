//! Provider backed by series held in memory

use crate::{trim_to_lookback, Lookback, MarketDataProvider, PriceBar, ProviderError, Result};
use std::collections::HashMap;

/// Returns pre-loaded bars. Symbols are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    series: HashMap<String, Vec<PriceBar>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the bars for `symbol`
    pub fn with_series(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.insert(symbol, bars);
        self
    }

    pub fn insert(&mut self, symbol: &str, bars: Vec<PriceBar>) {
        self.series.insert(symbol.to_uppercase(), bars);
    }
}

impl MarketDataProvider for InMemoryProvider {
    fn history(&self, symbol: &str, lookback: Lookback) -> Result<Vec<PriceBar>> {
        let bars = self
            .series
            .get(&symbol.to_uppercase())
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))?;

        Ok(trim_to_lookback(bars.clone(), lookback))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
