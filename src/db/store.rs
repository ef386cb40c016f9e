//! Log persistence seam
//!
//! Request handlers and the stats tools talk to storage through `LogStore`
//! rather than to SQLite directly.

use crate::models::{LogEntry, LogEntryCreate};

use super::connection::{Database, DbResult};

/// Storage operations for consumption-log entries
pub trait LogStore {
    /// All entries owned by an account (identifier is normalized by the store)
    fn list_entries(&self, owner: &str) -> DbResult<Vec<LogEntry>>;

    fn get_entry(&self, id: i64) -> DbResult<Option<LogEntry>>;

    fn insert_entry(&self, entry: &LogEntryCreate) -> DbResult<LogEntry>;

    /// Returns false when no entry had that id
    fn delete_entry(&self, id: i64) -> DbResult<bool>;
}

impl LogStore for Database {
    fn list_entries(&self, owner: &str) -> DbResult<Vec<LogEntry>> {
        self.with_conn(|conn| LogEntry::list_for_owner(conn, owner))
    }

    fn get_entry(&self, id: i64) -> DbResult<Option<LogEntry>> {
        self.with_conn(|conn| LogEntry::get_by_id(conn, id))
    }

    fn insert_entry(&self, entry: &LogEntryCreate) -> DbResult<LogEntry> {
        self.with_conn(|conn| LogEntry::create(conn, entry))
    }

    fn delete_entry(&self, id: i64) -> DbResult<bool> {
        self.with_conn(|conn| LogEntry::delete(conn, id))
    }
}
