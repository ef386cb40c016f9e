//! Statistics operations

use chrono::{DateTime, TimeZone};
use tracing::debug;

use crate::db::{Database, LogStore};
use crate::error::AppError;
use crate::models::User;
use crate::stats::{compute_stats, daily_summary, DailySummary, StatsSnapshot};

use super::require_identifier;

/// Fetch an account's entries and aggregate them relative to `now`.
///
/// A missing identifier is rejected before storage is touched.
pub fn get_stats<S, Tz>(store: &S, email: Option<&str>, now: &DateTime<Tz>) -> Result<StatsSnapshot, AppError>
where
    S: LogStore + ?Sized,
    Tz: TimeZone,
{
    let owner = require_identifier(email)?;
    let entries = store.list_entries(&owner)?;
    let stats = compute_stats(&entries, now);

    debug!(entries = entries.len(), peak = %stats.peak_intake.date, "Computed intake stats");
    Ok(stats)
}

/// Today's total against the account's daily goal
pub fn get_today_summary<Tz: TimeZone>(
    db: &Database,
    email: Option<&str>,
    now: &DateTime<Tz>,
) -> Result<DailySummary, AppError> {
    let owner = require_identifier(email)?;
    let user = db
        .with_conn(|conn| User::get_by_email(conn, &owner))?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

    let entries = db.list_entries(&owner)?;
    Ok(daily_summary(&entries, user.daily_goal, now))
}
