//! Monday-to-Friday business-day calendar (no exchange holidays)

use chrono::{Datelike, NaiveDate, Weekday};

/// Whether `date` falls on a weekday
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The first business day strictly after `date`
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    let mut next = date.succ_opt().unwrap_or(date);
    while !is_business_day(next) {
        next = next.succ_opt().unwrap_or(next);
    }
    next
}

/// `count` consecutive business days starting the day after `date`
pub fn business_days_after(date: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut current = date;
    for _ in 0..count {
        current = next_business_day(current);
        days.push(current);
    }
    days
}

/// Business days in the half-open range `(after, until]`
pub fn business_days_between(after: NaiveDate, until: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = next_business_day(after);
    while current <= until {
        days.push(current);
        current = next_business_day(current);
    }
    days
}
