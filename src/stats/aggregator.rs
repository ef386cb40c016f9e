//! Intake statistics aggregation
//!
//! `compute_stats` is a pure function of `(entries, now)`. Entries are
//! bucketed by the local calendar day of their effective timestamp, in the
//! timezone `now` carries, and window totals are read off those buckets.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::LogEntry;

use super::timestamp::{date_key, local_datetime};
use super::window::Windows;

/// Peak date reported when there is nothing to aggregate
pub const NO_DATA: &str = "no data";

/// Calories aggregated for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub total_calories: f64,
}

impl DailyBucket {
    pub fn date_key(&self) -> String {
        date_key(self.date)
    }
}

/// The day with the highest total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakIntake {
    pub calories: f64,
    /// `YYYY-MM-DD`, or [`NO_DATA`]
    pub date: String,
}

impl PeakIntake {
    pub fn none() -> Self {
        Self {
            calories: 0.0,
            date: NO_DATA.to_string(),
        }
    }
}

/// Statistics returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub week_total: f64,
    pub month_total: f64,
    pub year_total: f64,
    pub peak_intake: PeakIntake,
}

impl StatsSnapshot {
    pub fn empty() -> Self {
        Self {
            week_total: 0.0,
            month_total: 0.0,
            year_total: 0.0,
            peak_intake: PeakIntake::none(),
        }
    }
}

/// Compute week/month/year totals and the peak-intake day.
///
/// Entries with an unparseable timestamp are skipped. Non-finite calories
/// count as 0. Entries dated after `now` still count toward every window
/// whose start they clear.
pub fn compute_stats<Tz: TimeZone>(entries: &[LogEntry], now: &DateTime<Tz>) -> StatsSnapshot {
    let buckets = daily_buckets(entries, now);
    if buckets.is_empty() {
        return StatsSnapshot::empty();
    }

    let windows = Windows::anchored_at(now);

    StatsSnapshot {
        week_total: total_since(&buckets, windows.start_of_week),
        month_total: total_since(&buckets, windows.start_of_month),
        year_total: total_since(&buckets, windows.start_of_year),
        peak_intake: peak_intake(&buckets),
    }
}

/// Group entries into per-day totals, ordered by date
pub fn daily_buckets<Tz: TimeZone>(entries: &[LogEntry], now: &DateTime<Tz>) -> Vec<DailyBucket> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for entry in entries {
        let Some(date) = effective_date(entry, now) else {
            continue;
        };
        *totals.entry(date).or_insert(0.0) += calorie_contribution(entry);
    }

    totals
        .into_iter()
        .map(|(date, total_calories)| DailyBucket { date, total_calories })
        .collect()
}

/// Local calendar date an entry counts toward.
///
/// Uses `occurred_at`, then `recorded_at`, then `now` when neither is set.
/// The first present timestamp decides: if it does not parse the entry is
/// excluded rather than falling through to the next one.
pub fn effective_date<Tz: TimeZone>(entry: &LogEntry, now: &DateTime<Tz>) -> Option<NaiveDate> {
    let Some(raw) = effective_timestamp(entry) else {
        warn!(entry_id = entry.id, "log entry has no timestamp, counting it at aggregation time");
        return Some(now.date_naive());
    };

    match local_datetime(raw, &now.timezone()) {
        Some(local) => Some(local.date()),
        None => {
            warn!(entry_id = entry.id, timestamp = raw, "skipping log entry with unparseable timestamp");
            None
        }
    }
}

/// First non-blank of `occurred_at`, `recorded_at`
pub fn effective_timestamp(entry: &LogEntry) -> Option<&str> {
    [entry.occurred_at.as_deref(), entry.recorded_at.as_deref()]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
}

fn calorie_contribution(entry: &LogEntry) -> f64 {
    if entry.calories.is_finite() {
        entry.calories
    } else {
        warn!(entry_id = entry.id, "non-numeric calories on log entry, counting as 0");
        0.0
    }
}

fn total_since(buckets: &[DailyBucket], start: NaiveDate) -> f64 {
    buckets
        .iter()
        .filter(|b| b.date >= start)
        .map(|b| b.total_calories)
        .sum()
}

/// Highest daily total. Ties go to the earliest date.
pub fn peak_intake(buckets: &[DailyBucket]) -> PeakIntake {
    let mut peak: Option<&DailyBucket> = None;

    // Buckets are date-ordered; a strict comparison keeps the first maximum
    for bucket in buckets {
        if peak.map_or(true, |p| bucket.total_calories > p.total_calories) {
            peak = Some(bucket);
        }
    }

    match peak {
        Some(bucket) => PeakIntake {
            calories: bucket.total_calories,
            date: bucket.date_key(),
        },
        None => PeakIntake::none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, Utc};

    fn entry(id: i64, calories: f64, occurred_at: &str) -> LogEntry {
        LogEntry {
            id,
            owner: "a@x.com".to_string(),
            description: format!("item {id}"),
            calories,
            occurred_at: Some(occurred_at.to_string()),
            recorded_at: None,
        }
    }

    fn utc_now(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_entries() {
        let stats = compute_stats(&[], &utc_now(2024, 3, 12));
        assert_eq!(stats, StatsSnapshot::empty());
        assert_eq!(stats.peak_intake.date, NO_DATA);
        assert_eq!(stats.peak_intake.calories, 0.0);
    }

    #[test]
    fn test_week_month_year_example() {
        let entries = vec![
            entry(1, 100.0, "2024-03-10T09:00:00Z"), // Sunday
            entry(2, 200.0, "2024-03-11T13:00:00Z"),
            entry(3, 50.0, "2024-03-04T08:00:00Z"),
        ];
        let stats = compute_stats(&entries, &utc_now(2024, 3, 12));

        assert_eq!(stats.week_total, 300.0);
        assert_eq!(stats.month_total, 350.0);
        assert_eq!(stats.year_total, 350.0);
        assert_eq!(
            stats.peak_intake,
            PeakIntake { calories: 200.0, date: "2024-03-11".to_string() }
        );
    }

    #[test]
    fn test_same_day_entries_are_summed_for_peak() {
        let entries = vec![
            entry(1, 300.0, "2024-03-05T08:00:00Z"),
            entry(2, 300.0, "2024-03-05T19:00:00Z"),
            entry(3, 500.0, "2024-03-06T12:00:00Z"),
        ];
        let stats = compute_stats(&entries, &utc_now(2024, 3, 12));
        assert_eq!(stats.peak_intake.calories, 600.0);
        assert_eq!(stats.peak_intake.date, "2024-03-05");
    }

    #[test]
    fn test_peak_tie_goes_to_earliest_date_regardless_of_order() {
        let forward = vec![
            entry(1, 500.0, "2024-03-05T12:00:00Z"),
            entry(2, 500.0, "2024-03-07T12:00:00Z"),
            entry(3, 100.0, "2024-03-06T12:00:00Z"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let now = utc_now(2024, 3, 12);
        let a = compute_stats(&forward, &now);
        let b = compute_stats(&reversed, &now);
        assert_eq!(a.peak_intake.date, "2024-03-05");
        assert_eq!(a.peak_intake, b.peak_intake);
        assert_eq!(a, compute_stats(&forward, &now));
    }

    #[test]
    fn test_start_of_month_midnight_is_inclusive() {
        let now = utc_now(2024, 3, 20);
        let entries = vec![
            entry(1, 100.0, "2024-03-01T00:00:00Z"),
            entry(2, 40.0, "2024-02-29T23:59:59Z"),
        ];
        let stats = compute_stats(&entries, &now);
        assert_eq!(stats.month_total, 100.0);
        assert_eq!(stats.year_total, 140.0);
    }

    #[test]
    fn test_sunday_now_starts_week_today() {
        let now = utc_now(2024, 3, 10);
        let entries = vec![
            entry(1, 100.0, "2024-03-10T00:00:00Z"),
            entry(2, 70.0, "2024-03-09T23:00:00Z"),
        ];
        let stats = compute_stats(&entries, &now);
        assert_eq!(stats.week_total, 100.0);
        assert_eq!(stats.month_total, 170.0);
    }

    #[test]
    fn test_future_entries_count_toward_windows() {
        let now = utc_now(2024, 3, 12);
        let entries = vec![entry(1, 250.0, "2024-03-14T12:00:00Z")];
        let stats = compute_stats(&entries, &now);
        assert_eq!(stats.week_total, 250.0);
        assert_eq!(stats.month_total, 250.0);
        assert_eq!(stats.year_total, 250.0);
    }

    #[test]
    fn test_previous_year_only_affects_peak() {
        let now = utc_now(2024, 3, 12);
        let entries = vec![
            entry(1, 900.0, "2023-12-25T12:00:00Z"),
            entry(2, 100.0, "2024-03-11T12:00:00Z"),
        ];
        let stats = compute_stats(&entries, &now);
        assert_eq!(stats.year_total, 100.0);
        assert_eq!(stats.peak_intake.calories, 900.0);
        assert_eq!(stats.peak_intake.date, "2023-12-25");
    }

    #[test]
    fn test_week_straddling_month_boundary_keeps_sunday_anchor() {
        // Saturday 2024-03-02; the week began Sunday 2024-02-25
        let now = utc_now(2024, 3, 2);
        let entries = vec![
            entry(1, 400.0, "2024-02-27T12:00:00Z"),
            entry(2, 100.0, "2024-03-01T12:00:00Z"),
        ];
        let stats = compute_stats(&entries, &now);
        assert_eq!(stats.week_total, 500.0);
        assert_eq!(stats.month_total, 100.0);
        assert_eq!(stats.year_total, 500.0);
    }

    #[test]
    fn test_malformed_timestamp_is_skipped() {
        let entries = vec![
            entry(1, 100.0, "not a date"),
            entry(2, 200.0, "2024-03-11T12:00:00Z"),
        ];
        let stats = compute_stats(&entries, &utc_now(2024, 3, 12));
        assert_eq!(stats.year_total, 200.0);
        assert_eq!(stats.peak_intake.calories, 200.0);
    }

    #[test]
    fn test_only_malformed_timestamps_reports_no_data() {
        let entries = vec![entry(1, 100.0, "garbage")];
        let stats = compute_stats(&entries, &utc_now(2024, 3, 12));
        assert_eq!(stats, StatsSnapshot::empty());
    }

    #[test]
    fn test_non_finite_calories_count_as_zero() {
        let entries = vec![
            entry(1, f64::NAN, "2024-03-11T12:00:00Z"),
            entry(2, f64::INFINITY, "2024-03-11T13:00:00Z"),
            entry(3, 80.0, "2024-03-11T14:00:00Z"),
        ];
        let stats = compute_stats(&entries, &utc_now(2024, 3, 12));
        assert_eq!(stats.week_total, 80.0);
        assert_eq!(stats.peak_intake.calories, 80.0);
    }

    #[test]
    fn test_effective_date_falls_back_to_recorded_then_now() {
        let now = utc_now(2024, 3, 12);
        let mut e = entry(1, 10.0, "2024-03-01T12:00:00Z");
        assert_eq!(effective_date(&e, &now), NaiveDate::from_ymd_opt(2024, 3, 1));

        e.occurred_at = None;
        e.recorded_at = Some("2024-03-05 10:00:00".to_string());
        assert_eq!(effective_date(&e, &now), NaiveDate::from_ymd_opt(2024, 3, 5));

        e.occurred_at = Some("  ".to_string());
        assert_eq!(effective_date(&e, &now), NaiveDate::from_ymd_opt(2024, 3, 5));

        e.recorded_at = None;
        assert_eq!(effective_date(&e, &now), NaiveDate::from_ymd_opt(2024, 3, 12));
    }

    #[test]
    fn test_buckets_use_now_timezone() {
        // 03:00Z on the 11th is the evening of the 10th in UTC-5
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = est.with_ymd_and_hms(2024, 3, 12, 9, 0, 0).unwrap();
        let entries = vec![entry(1, 100.0, "2024-03-11T03:00:00Z")];

        let buckets = daily_buckets(&entries, &now);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].date_key(), "2024-03-10");

        let utc_buckets = daily_buckets(&entries, &now.with_timezone(&Utc));
        assert_eq!(utc_buckets[0].date_key(), "2024-03-11");
    }

    #[test]
    fn test_bucket_totals_match_entry_totals() {
        let start = Utc.with_ymd_and_hms(2023, 11, 1, 6, 0, 0).unwrap();
        let entries: Vec<LogEntry> = (0..200)
            .map(|i| {
                let at = start + Duration::hours(i * 7);
                entry(i, (i % 13) as f64 * 37.5, &at.to_rfc3339())
            })
            .collect();

        let now = utc_now(2024, 1, 20);
        let bucket_sum: f64 = daily_buckets(&entries, &now).iter().map(|b| b.total_calories).sum();
        let entry_sum: f64 = entries.iter().map(|e| e.calories).sum();
        assert!((bucket_sum - entry_sum).abs() < 1e-6);
    }

    #[test]
    fn test_window_totals_are_ordered() {
        let start = Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap();
        let entries: Vec<LogEntry> = (0..120)
            .map(|i| {
                let at = start + Duration::hours(i * 11);
                entry(i, 50.0 + (i % 5) as f64 * 20.0, &at.to_rfc3339())
            })
            .collect();

        for day in 0..60 {
            let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::days(day);
            let stats = compute_stats(&entries, &now);
            let windows = Windows::anchored_at(&now);

            assert!(stats.month_total <= stats.year_total);
            if windows.start_of_week >= windows.start_of_month {
                assert!(stats.week_total <= stats.month_total, "now = {now}");
            }
            assert_eq!(stats, compute_stats(&entries, &now));
        }
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = serde_json::to_value(StatsSnapshot::empty()).unwrap();
        assert_eq!(json["weekTotal"], 0.0);
        assert_eq!(json["monthTotal"], 0.0);
        assert_eq!(json["yearTotal"], 0.0);
        assert_eq!(json["peakIntake"]["calories"], 0.0);
        assert_eq!(json["peakIntake"]["date"], NO_DATA);
    }
}
