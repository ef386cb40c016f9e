//! Calorie Tracker MCP Server
//!
//! Exposes the logging, statistics and goal operations as MCP tools over stdio.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::error::AppError;
use crate::search::FoodSearch;
use crate::tools::accounts::{self, SetGoalRequest};
use crate::tools::logs::{self, AddLogRequest};
use crate::tools::status::StatusTracker;
use crate::tools::{foods, stats};

/// Calorie Tracker MCP Service
#[derive(Clone)]
pub struct CalorieService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    search: Arc<dyn FoodSearch>,
    tool_router: ToolRouter<CalorieService>,
}

impl CalorieService {
    pub fn new(database_path: PathBuf, database: Database, search: Arc<dyn FoodSearch>, search_configured: bool) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path, search_configured))),
            database,
            search,
            tool_router: Self::tool_router(),
        }
    }
}

/// Bad input becomes `invalid_params`, everything else `internal_error`
fn to_mcp_error(err: AppError) -> McpError {
    match err {
        AppError::Validation(msg) => McpError::invalid_params(msg, None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogFoodParams {
    /// Account email (case-insensitive)
    pub email: String,
    /// What was eaten
    pub description: String,
    /// Calories consumed (non-negative)
    pub calories: f64,
    /// When it was eaten: RFC 3339, "YYYY-MM-DD HH:MM:SS" (UTC) or "YYYY-MM-DD". Defaults to now.
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EmailParams {
    /// Account email (case-insensitive)
    pub email: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteLogParams {
    /// Account email that owns the entry
    pub email: String,
    /// Log entry ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetDailyGoalParams {
    pub email: String,
    /// Daily calorie goal (must be positive)
    pub daily_goal: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFoodsParams {
    /// Food name to look up in USDA FoodData Central
    pub query: String,
}

#[derive(Debug, Serialize)]
struct DeleteLogResponse {
    success: bool,
    id: i64,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl CalorieService {
    #[tool(description = "Get the current status of the tracker including build info, database status and process information")]
    async fn tracker_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker
            .get_status(&self.database)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        json_result(&status)
    }

    // --- Logs ---

    #[tool(description = "Log food eaten by an account. The date defaults to now.")]
    fn log_food(&self, Parameters(p): Parameters<LogFoodParams>) -> Result<CallToolResult, McpError> {
        let request = AddLogRequest {
            user_email: Some(p.email),
            description: Some(p.description),
            calories: Some(p.calories),
            date: p.date,
        };
        let entry = logs::add_log(&self.database, request).map_err(to_mcp_error)?;
        json_result(&entry)
    }

    #[tool(description = "List an account's log entries, newest first")]
    fn list_logs(&self, Parameters(p): Parameters<EmailParams>) -> Result<CallToolResult, McpError> {
        let entries = logs::list_logs(&self.database, Some(&p.email)).map_err(to_mcp_error)?;
        json_result(&entries)
    }

    #[tool(description = "Delete a log entry owned by the given account")]
    fn delete_log(&self, Parameters(p): Parameters<DeleteLogParams>) -> Result<CallToolResult, McpError> {
        logs::delete_log(&self.database, p.id, &p.email).map_err(to_mcp_error)?;
        json_result(&DeleteLogResponse { success: true, id: p.id })
    }

    // --- Statistics ---

    #[tool(description = "Weekly, monthly and yearly calorie totals plus the highest-intake day, relative to today")]
    fn get_stats(&self, Parameters(p): Parameters<EmailParams>) -> Result<CallToolResult, McpError> {
        let snapshot = stats::get_stats(&self.database, Some(&p.email), &Local::now()).map_err(to_mcp_error)?;
        json_result(&snapshot)
    }

    #[tool(description = "Today's calorie total against the account's daily goal")]
    fn get_today_summary(&self, Parameters(p): Parameters<EmailParams>) -> Result<CallToolResult, McpError> {
        let summary = stats::get_today_summary(&self.database, Some(&p.email), &Local::now()).map_err(to_mcp_error)?;
        json_result(&summary)
    }

    #[tool(description = "Set an account's daily calorie goal")]
    fn set_daily_goal(&self, Parameters(p): Parameters<SetDailyGoalParams>) -> Result<CallToolResult, McpError> {
        let request = SetGoalRequest {
            email: Some(p.email),
            daily_goal: Some(p.daily_goal),
        };
        let goal = accounts::set_goal(&self.database, request).map_err(to_mcp_error)?;
        json_result(&goal)
    }

    // --- Food search ---

    #[tool(description = "Search USDA FoodData Central for foods and their calories per serving")]
    async fn search_foods(&self, Parameters(p): Parameters<SearchFoodsParams>) -> Result<CallToolResult, McpError> {
        let hits = foods::search_foods(self.search.as_ref(), Some(&p.query))
            .await
            .map_err(to_mcp_error)?;
        json_result(&hits)
    }
}

#[tool_handler]
impl ServerHandler for CalorieService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "calorie_tracker".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Calorie Tracker".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Calorie Tracker - personal calorie logging with intake statistics. \
                 Every tool takes the account email; it is matched case-insensitively. \
                 Logs: log_food, list_logs, delete_log. \
                 Statistics: get_stats (week/month/year totals and peak day), get_today_summary. \
                 Goal: set_daily_goal. Lookup: search_foods. Status: tracker_status."
                    .into(),
            ),
        }
    }
}
