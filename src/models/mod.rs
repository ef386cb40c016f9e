//! Data models
//!
//! Rust structs representing database entities.

mod log_entry;
mod session;
mod user;

pub use log_entry::{coerce_calories, LogEntry, LogEntryCreate};
pub use session::Session;
pub use user::{hash_password, normalize_email, verify_password, User, UserCreate};
