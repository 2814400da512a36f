//! Business-day calendar: Monday to Friday, no holidays.

use chrono::{Datelike, NaiveDate, Weekday};

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The first business day strictly after `date`.
pub fn next_business_day(date: NaiveDate) -> Option<NaiveDate> {
    let mut d = date.succ_opt()?;
    while !is_business_day(d) {
        d = d.succ_opt()?;
    }
    Some(d)
}

/// The `n` business days strictly after `after`, in order.
///
/// Works from any anchor, including a weekend date.
pub fn business_days_after(after: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(n);
    let mut cur = after;
    while out.len() < n {
        match next_business_day(cur) {
            Some(d) => {
                out.push(d);
                cur = d;
            }
            None => break,
        }
    }
    out
}
