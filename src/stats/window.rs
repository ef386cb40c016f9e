//! Calendar windows
//!
//! Week, month and year windows open at local midnight on their first day
//! and have no upper bound. An instant is at or after local midnight of day
//! `D` exactly when its local date is on or after `D`, so anchors are kept
//! as calendar dates.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use serde::Serialize;

/// First days of the current week, month and year relative to a `now`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Windows {
    pub start_of_week: NaiveDate,
    pub start_of_month: NaiveDate,
    pub start_of_year: NaiveDate,
}

impl Windows {
    /// Anchors for `now`, read from `now`'s own local calendar
    pub fn anchored_at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self::for_date(now.date_naive())
    }

    pub fn for_date(today: NaiveDate) -> Self {
        Self {
            start_of_week: start_of_week(today),
            start_of_month: start_of_month(today),
            start_of_year: start_of_year(today),
        }
    }
}

/// Most recent Sunday on or before `date`
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn start_of_year(date: NaiveDate) -> NaiveDate {
    date.with_ordinal(1).unwrap_or(date)
}
