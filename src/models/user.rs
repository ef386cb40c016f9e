//! User model
//!
//! Accounts are keyed by lower-cased email. Passwords are stored as salted
//! Argon2 hashes in PHC string form.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Canonical form of an account identifier: trimmed and lower-cased
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip)]
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub daily_goal: f64,
    #[serde(skip)]
    pub created_at: String,
}

/// Data for creating a user
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub name: Option<String>,
    pub email: String,
    pub password: String,
    pub daily_goal: f64,
}

impl User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            daily_goal: row.get("daily_goal")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Create a new user, hashing the password
    pub fn create(conn: &Connection, data: &UserCreate) -> DbResult<Self> {
        let password_hash = hash_password(&data.password)?;
        let name = data
            .name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        conn.execute(
            r#"
            INSERT INTO users (name, email, password_hash, daily_goal)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![name, normalize_email(&data.email), password_hash, data.daily_goal],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a user by email (case-insensitive)
    pub fn get_by_email(conn: &Connection, email: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM users WHERE email = ?1")?;

        match stmt.query_row([normalize_email(email)], Self::from_row) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Return the user only if the password matches
    pub fn authenticate(conn: &Connection, email: &str, password: &str) -> DbResult<Option<Self>> {
        let user = Self::get_by_email(conn, email)?;
        Ok(user.filter(|u| u.verify_password(password)))
    }

    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(&self.password_hash, password)
    }

    /// Update the daily calorie goal
    pub fn set_daily_goal(conn: &Connection, email: &str, daily_goal: f64) -> DbResult<Option<Self>> {
        conn.execute(
            "UPDATE users SET daily_goal = ?1 WHERE email = ?2",
            params![daily_goal, normalize_email(email)],
        )?;
        Self::get_by_email(conn, email)
    }
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt_bytes: [u8; 16] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| DbError::PasswordHash(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbError::PasswordHash(e.to_string()))
}

/// Verify a password against a stored PHC hash.
///
/// Digest comparison happens inside `argon2` in constant time. A stored value
/// that is not a valid PHC string never verifies.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
