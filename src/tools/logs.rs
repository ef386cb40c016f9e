//! Log entry operations
//!
//! Add, list and delete consumption-log entries.

use std::cmp::Reverse;

use chrono::{Local, NaiveDateTime, TimeZone};
use serde::Deserialize;
use tracing::info;

use crate::db::LogStore;
use crate::error::AppError;
use crate::models::{LogEntry, LogEntryCreate};
use crate::stats::{effective_timestamp, is_valid_timestamp, local_datetime};

use super::require_identifier;

/// Body of an add-log request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLogRequest {
    pub user_email: Option<String>,
    pub description: Option<String>,
    pub calories: Option<f64>,
    /// When the food was eaten; defaults to now
    pub date: Option<String>,
}

/// Validate and store a new log entry
pub fn add_log<S: LogStore + ?Sized>(store: &S, request: AddLogRequest) -> Result<LogEntry, AppError> {
    let owner = require_identifier(request.user_email.as_deref())?;

    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::missing_param("description"))?;

    let calories = request.calories.ok_or_else(|| AppError::missing_param("calories"))?;
    if !calories.is_finite() || calories < 0.0 {
        return Err(AppError::Validation(
            "calories must be a non-negative number".to_string(),
        ));
    }

    let occurred_at = request.date.filter(|d| !d.trim().is_empty());
    if let Some(date) = occurred_at.as_deref() {
        if !is_valid_timestamp(date) {
            return Err(AppError::Validation(format!("Unrecognized date: {date}")));
        }
    }

    let entry = store.insert_entry(&LogEntryCreate {
        owner,
        description: description.to_string(),
        calories,
        occurred_at,
    })?;

    info!(entry_id = entry.id, calories = entry.calories, "Logged food");
    Ok(entry)
}

/// All entries for an account, newest first
pub fn list_logs<S: LogStore + ?Sized>(store: &S, email: Option<&str>) -> Result<Vec<LogEntry>, AppError> {
    let owner = require_identifier(email)?;
    let mut entries = store.list_entries(&owner)?;
    sort_newest_first(&mut entries, &Local);
    Ok(entries)
}

/// Delete an entry owned by `owner`.
///
/// An entry that belongs to another account is reported as not found.
pub fn delete_log<S: LogStore + ?Sized>(store: &S, id: i64, owner: &str) -> Result<(), AppError> {
    let owner = require_identifier(Some(owner))?;
    let not_found = || AppError::NotFound(format!("Log entry {id} not found"));

    match store.get_entry(id)? {
        Some(entry) if entry.owner == owner => {}
        _ => return Err(not_found()),
    }

    if !store.delete_entry(id)? {
        return Err(not_found());
    }

    info!(entry_id = id, "Deleted log entry");
    Ok(())
}

/// Sort by effective timestamp descending, then id descending.
///
/// Uses the same timestamp as the stats buckets. Entries whose timestamp
/// does not parse go last.
pub fn sort_newest_first<Tz: TimeZone>(entries: &mut [LogEntry], tz: &Tz) {
    entries.sort_by_cached_key(|e| Reverse((sort_timestamp(e, tz), e.id)));
}

fn sort_timestamp<Tz: TimeZone>(entry: &LogEntry, tz: &Tz) -> Option<NaiveDateTime> {
    effective_timestamp(entry).and_then(|raw| local_datetime(raw, tz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::Utc;

    fn request(email: &str, calories: f64, date: Option<&str>) -> AddLogRequest {
        AddLogRequest {
            user_email: Some(email.to_string()),
            description: Some("Greek yogurt".to_string()),
            calories: Some(calories),
            date: date.map(str::to_string),
        }
    }

    #[test]
    fn test_add_log_validates_input() {
        let db = Database::in_memory().unwrap();

        let missing_email = AddLogRequest { user_email: None, ..request("a@x.com", 100.0, None) };
        assert!(matches!(add_log(&db, missing_email), Err(AppError::Validation(_))));

        let blank_description = AddLogRequest {
            description: Some("  ".into()),
            ..request("a@x.com", 100.0, None)
        };
        assert!(matches!(add_log(&db, blank_description), Err(AppError::Validation(_))));

        assert!(matches!(add_log(&db, request("a@x.com", -5.0, None)), Err(AppError::Validation(_))));
        assert!(matches!(add_log(&db, request("a@x.com", f64::NAN, None)), Err(AppError::Validation(_))));
        assert!(matches!(
            add_log(&db, request("a@x.com", 100.0, Some("last tuesday"))),
            Err(AppError::Validation(_))
        ));

        assert!(db.list_entries("a@x.com").unwrap().is_empty());
    }

    #[test]
    fn test_add_log_normalizes_owner() {
        let db = Database::in_memory().unwrap();
        let entry = add_log(&db, request("Ansh@Example.com", 120.0, Some("2024-03-10"))).unwrap();
        assert_eq!(entry.owner, "ansh@example.com");
        assert_eq!(entry.occurred_at.as_deref(), Some("2024-03-10"));

        let listed = list_logs(&db, Some("ANSH@EXAMPLE.COM")).unwrap();
        assert_eq!(listed, vec![entry]);
    }

    #[test]
    fn test_list_logs_newest_first() {
        let db = Database::in_memory().unwrap();
        add_log(&db, request("a@x.com", 1.0, Some("2024-03-11T08:00:00Z"))).unwrap();
        add_log(&db, request("a@x.com", 2.0, Some("2024-03-09T08:00:00Z"))).unwrap();
        add_log(&db, request("a@x.com", 3.0, Some("2024-03-12T08:00:00Z"))).unwrap();

        let calories: Vec<f64> = list_logs(&db, Some("a@x.com"))
            .unwrap()
            .iter()
            .map(|e| e.calories)
            .collect();
        assert_eq!(calories, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_list_logs_requires_identifier() {
        let db = Database::in_memory().unwrap();
        assert!(matches!(list_logs(&db, None), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_delete_log_checks_owner() {
        let db = Database::in_memory().unwrap();
        let entry = add_log(&db, request("a@x.com", 100.0, None)).unwrap();

        assert!(matches!(delete_log(&db, entry.id, "b@x.com"), Err(AppError::NotFound(_))));
        delete_log(&db, entry.id, "A@X.com").unwrap();
        assert!(matches!(delete_log(&db, entry.id, "a@x.com"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_unparseable_timestamps_sort_last() {
        let make = |id: i64, at: &str| LogEntry {
            id,
            owner: "a@x.com".into(),
            description: "x".into(),
            calories: 0.0,
            occurred_at: Some(at.into()),
            recorded_at: None,
        };
        let mut entries = vec![make(1, "junk"), make(2, "2024-03-01"), make(3, "2024-03-02")];
        sort_newest_first(&mut entries, &Utc);
        let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_blank_occurred_at_sorts_by_recorded_at() {
        let make = |id: i64, occurred: &str, recorded: &str| LogEntry {
            id,
            owner: "a@x.com".into(),
            description: "x".into(),
            calories: 0.0,
            occurred_at: Some(occurred.into()),
            recorded_at: Some(recorded.into()),
        };
        let mut entries = vec![
            make(1, "  ", "2024-03-05T10:00:00Z"),
            make(2, "2024-03-01", "2024-03-01T10:00:00Z"),
        ];
        sort_newest_first(&mut entries, &Utc);
        let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
