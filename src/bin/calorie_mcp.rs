//! Calorie Tracker MCP server
//!
//! Serves the tracker's tools over stdio.

use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use calorie_tracker::build_info;
use calorie_tracker::config::Config;
use calorie_tracker::db::{migrations, Database};
use calorie_tracker::mcp::CalorieService;
use calorie_tracker::search::{UsdaClient, UsdaConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    // stdout carries the MCP protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("calorie_tracker=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = Config::load()?;
    eprintln!("Database path: {}", config.database_path.display());

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::new(&config.database_path)?;
    database.with_conn(|conn| {
        migrations::run_migrations(conn)?;
        let version = migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    let search_configured = config.usda_api_key.is_some();
    let search = UsdaClient::new(UsdaConfig::new(&config.usda_base_url, config.usda_api_key.clone()))?;

    let service = CalorieService::new(config.database_path, database, Arc::new(search), search_configured);

    let server = service.serve((stdin(), stdout())).await?;
    server.waiting().await?;

    Ok(())
}
