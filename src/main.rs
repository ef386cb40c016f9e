//! Calorie Tracker
//!
//! HTTP service for calorie logging and intake statistics.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use calorie_tracker::build_info;
use calorie_tracker::config::Config;
use calorie_tracker::db::{migrations, Database};
use calorie_tracker::http::{self, AppState};
use calorie_tracker::models::Session;
use calorie_tracker::search::{UsdaClient, UsdaConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("calorie_tracker=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();

    let config = Config::load()?;
    info!("Database path: {}", config.database_path.display());

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::new(&config.database_path)?;
    database.with_conn(|conn| {
        migrations::run_migrations(conn)?;
        let version = migrations::get_schema_version(conn)?;
        info!("Database schema version: {version}");

        let purged = Session::purge_expired(conn, Utc::now())?;
        if purged > 0 {
            info!("Removed {purged} expired sessions");
        }
        Ok(())
    })?;

    if config.usda_api_key.is_none() {
        warn!("Food search requests will fail until USDA_API_KEY is set");
    }
    let search = UsdaClient::new(UsdaConfig::new(&config.usda_base_url, config.usda_api_key.clone()))?;

    let state = AppState::new(database, config, Arc::new(search));
    http::serve(state).await?;

    Ok(())
}
