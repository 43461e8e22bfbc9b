//! Utility functions for the forecast_trade crate

use chrono::NaiveDate;
use market_data::calendar::business_days_after;

/// Round to two decimal places (half away from zero)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Short label such as `Jan 05`
pub fn date_label(date: NaiveDate) -> String {
    date.format("%b %d").to_string()
}

/// Dates for a `horizon`-day forecast: the business days after `last`
pub fn forecast_dates(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    business_days_after(last, horizon)
}

/// Percentage move from `from` to `to`
pub fn pct_move(from: f64, to: f64) -> f64 {
    (to - from) / from * 100.0
}
