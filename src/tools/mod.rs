//! Calorie Tracker operations
//!
//! Transport-independent request handling shared by the HTTP routes and the
//! MCP tools: validation, identifier normalization, persistence calls.

pub mod accounts;
pub mod foods;
pub mod logs;
pub mod stats;
pub mod status;

use crate::error::AppError;
use crate::models::normalize_email;

/// Normalize an account identifier, rejecting a missing or blank one
pub fn require_identifier(raw: Option<&str>) -> Result<String, AppError> {
    let email = raw.map(normalize_email).unwrap_or_default();
    if email.is_empty() {
        return Err(AppError::missing_param("email"));
    }
    Ok(email)
}
