//! Discrete trade signal derived from the forecast move

use serde::{Deserialize, Serialize};
use std::fmt;

/// Call attached to a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSignal {
    #[serde(rename = "STRONG BUY")]
    StrongBuy,
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "SELL")]
    Sell,
}

impl TradeSignal {
    /// Thresholds are checked in order, each strict: above 5% is a strong
    /// buy, above 1% a buy, above -2% a hold, anything else a sell.
    pub fn classify(delta_pct: f64) -> Self {
        if delta_pct > 5.0 {
            TradeSignal::StrongBuy
        } else if delta_pct > 1.0 {
            TradeSignal::Buy
        } else if delta_pct > -2.0 {
            TradeSignal::Hold
        } else {
            TradeSignal::Sell
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSignal::StrongBuy => "STRONG BUY",
            TradeSignal::Buy => "BUY",
            TradeSignal::Hold => "HOLD",
            TradeSignal::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
