//! Calorie Tracker Library
//!
//! Calorie logging, intake statistics and daily goals, served over HTTP and MCP.

pub mod build_info;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod mcp;
pub mod models;
pub mod search;
pub mod stats;
pub mod tools;
