//! Session model
//!
//! Bearer tokens issued at signup/login. Each token carries an explicit
//! expiry; refreshing rotates the token.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{DbError, DbResult};
use super::normalize_email;

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

fn parse_utc(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl Session {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            token: row.get("token")?,
            user_email: row.get("user_email")?,
            created_at: parse_utc(row, "created_at")?,
            expires_at: parse_utc(row, "expires_at")?,
        })
    }

    /// Issue a new session for an account
    pub fn create(conn: &Connection, email: &str, ttl: Duration, now: DateTime<Utc>) -> DbResult<Self> {
        let expires_at = now.checked_add_signed(ttl).ok_or(DbError::ExpiryOutOfRange)?;
        let session = Self {
            token: Uuid::new_v4().simple().to_string(),
            user_email: normalize_email(email),
            created_at: now,
            expires_at,
        };

        conn.execute(
            "INSERT INTO sessions (token, user_email, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token,
                session.user_email,
                format_utc(&session.created_at),
                format_utc(&session.expires_at),
            ],
        )?;

        Ok(session)
    }

    /// Get a session by token, if it exists and has not expired.
    ///
    /// Expired sessions are removed as they are encountered.
    pub fn get_active(conn: &Connection, token: &str, now: DateTime<Utc>) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM sessions WHERE token = ?1")?;

        let session = match stmt.query_row([token], Self::from_row) {
            Ok(session) => session,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if session.is_expired(now) {
            Self::revoke(conn, token)?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Replace an active session with a fresh token and expiry
    pub fn refresh(conn: &Connection, token: &str, ttl: Duration, now: DateTime<Utc>) -> DbResult<Option<Self>> {
        let Some(current) = Self::get_active(conn, token, now)? else {
            return Ok(None);
        };

        Self::revoke(conn, &current.token)?;
        Self::create(conn, &current.user_email, ttl, now).map(Some)
    }

    /// Delete a session. Returns false when the token was unknown.
    pub fn revoke(conn: &Connection, token: &str) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?;
        Ok(rows > 0)
    }

    /// Remove all sessions that expired before `now`
    pub fn purge_expired(conn: &Connection, now: DateTime<Utc>) -> DbResult<usize> {
        let rows = conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            [format_utc(&now)],
        )?;
        Ok(rows)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
