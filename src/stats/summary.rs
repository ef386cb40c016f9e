//! Today's intake against the daily goal

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::models::LogEntry;

use super::aggregator::daily_buckets;
use super::timestamp::date_key;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: String,
    pub total: f64,
    pub goal: f64,
    /// Calories left before the goal is reached, never negative
    pub remaining: f64,
    /// Share of the goal consumed, capped at 100
    pub percentage: f64,
}

/// Summarize the entries that fall on `now`'s local date
pub fn daily_summary<Tz: TimeZone>(entries: &[LogEntry], goal: f64, now: &DateTime<Tz>) -> DailySummary {
    let today = now.date_naive();
    let total = daily_buckets(entries, now)
        .into_iter()
        .find(|b| b.date == today)
        .map(|b| b.total_calories)
        .unwrap_or(0.0);

    let percentage = if goal > 0.0 {
        (total / goal * 100.0).min(100.0)
    } else {
        0.0
    };

    DailySummary {
        date: date_key(today),
        total,
        goal,
        remaining: (goal - total).max(0.0),
        percentage,
    }
}
