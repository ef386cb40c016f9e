//! Intake statistics module
//!
//! Pure computations over log entries: daily buckets, peak intake, calendar
//! window totals, and today's progress against the goal.

pub mod aggregator;
pub mod summary;
pub mod timestamp;
pub mod window;

pub use aggregator::{
    compute_stats, daily_buckets, effective_date, effective_timestamp, peak_intake, DailyBucket, PeakIntake,
    StatsSnapshot, NO_DATA,
};
pub use summary::{daily_summary, DailySummary};
pub use timestamp::{date_key, is_valid_timestamp, local_datetime};
pub use window::{start_of_month, start_of_week, start_of_year, Windows};
