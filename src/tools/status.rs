//! Tracker status
//!
//! Runtime information about the running service for the `tracker_status` tool.

use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::{migrations, Database, DbResult};

/// Runtime status of the tracker
#[derive(Debug, Clone, Serialize)]
pub struct TrackerStatus {
    pub build: BuildInfo,

    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub schema_version: i32,
    pub food_search_configured: bool,

    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    food_search_configured: bool,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf, food_search_configured: bool) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            food_search_configured,
        }
    }

    pub fn get_status(&self, db: &Database) -> DbResult<TrackerStatus> {
        let schema_version = db.with_conn(migrations::get_schema_version)?;

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));
        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        Ok(TrackerStatus {
            build: BuildInfo::current(),
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            schema_version,
            food_search_configured: self.food_search_configured,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        })
    }
}
