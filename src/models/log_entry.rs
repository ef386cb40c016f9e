//! Log Entry model
//!
//! One recorded consumption event: a food description, its calories, and
//! when it was eaten.

use chrono::{SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::DbResult;
use super::normalize_email;

/// A consumed item belonging to exactly one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: i64,
    /// Lower-cased email of the owning account
    #[serde(rename = "userEmail")]
    pub owner: String,
    pub description: String,
    pub calories: f64,
    /// When the food was eaten (RFC 3339, `YYYY-MM-DD HH:MM:SS` UTC, or `YYYY-MM-DD`)
    #[serde(rename = "date")]
    pub occurred_at: Option<String>,
    /// When the entry was logged
    #[serde(rename = "createdAt")]
    pub recorded_at: Option<String>,
}

/// Data for creating a log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntryCreate {
    pub owner: String,
    pub description: String,
    pub calories: f64,
    pub occurred_at: Option<String>,
}

impl LogEntry {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let id: i64 = row.get("id")?;
        let calories = coerce_calories(row.get("calories")?).unwrap_or_else(|| {
            warn!(entry_id = id, "non-numeric calories on log entry, counting as 0");
            0.0
        });

        Ok(Self {
            id,
            owner: row.get("user_email")?,
            description: row.get("description")?,
            calories,
            occurred_at: row.get("occurred_at")?,
            recorded_at: row.get("recorded_at")?,
        })
    }

    /// Create a new log entry.
    ///
    /// The owner is normalized and `recorded_at` is stamped with the current
    /// time. A missing `occurred_at` defaults to the same instant.
    pub fn create(conn: &Connection, data: &LogEntryCreate) -> DbResult<Self> {
        let recorded_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let occurred_at = data
            .occurred_at
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| recorded_at.clone());

        conn.execute(
            r#"
            INSERT INTO log_entries (user_email, description, calories, occurred_at, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                normalize_email(&data.owner),
                data.description.trim(),
                data.calories,
                occurred_at,
                recorded_at,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a log entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM log_entries WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get every log entry for an account, most recently inserted first
    pub fn list_for_owner(conn: &Connection, owner: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM log_entries WHERE user_email = ?1 ORDER BY id DESC"
        )?;

        let entries = stmt
            .query_map([normalize_email(owner)], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Delete a log entry
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM log_entries WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

/// Read a calorie column that SQLite may hold as REAL, INTEGER, TEXT or NULL.
///
/// Returns `None` when the stored value is not a finite number.
pub fn coerce_calories(value: Value) -> Option<f64> {
    let calories = match value {
        Value::Real(v) => v,
        Value::Integer(v) => v as f64,
        Value::Text(s) => s.trim().parse::<f64>().ok()?,
        Value::Null | Value::Blob(_) => return None,
    };
    calories.is_finite().then_some(calories)
}
