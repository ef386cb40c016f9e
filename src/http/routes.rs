//! Route handlers
//!
//! Each handler extracts its input, runs the blocking database work on the
//! Tokio blocking pool and maps failures through `AppError`.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Local, Utc};
use serde::Deserialize;
use tracing::error;

use crate::build_info::BuildInfo;
use crate::db::Database;
use crate::error::AppError;
use crate::models::LogEntry;
use crate::search::FoodHit;
use crate::stats::{DailySummary, StatsSnapshot};
use crate::tools::accounts::{self, GoalResponse, LoginRequest, SessionResponse, SetGoalRequest, SignupRequest};
use crate::tools::logs::{self, AddLogRequest};
use crate::tools::{foods, require_identifier, stats};

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub food_name: Option<String>,
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn require_token(token: Option<String>) -> Result<String, AppError> {
    token.ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))
}

/// Validate the identifier first, then check the session belongs to it
fn authorized_owner(db: &Database, token: Option<String>, email: Option<&str>) -> Result<String, AppError> {
    let owner = require_identifier(email)?;
    let token = require_token(token)?;
    accounts::authorize(db, &token, &owner, Utc::now())?;
    Ok(owner)
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

fn query_param<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

fn path_param<T>(path: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    path.map(|Path(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

async fn blocking<F, T>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("Blocking task failed: {e}");
        AppError::Internal("Server Error".to_string())
    })?
}

pub async fn health() -> Json<BuildInfo> {
    Json(BuildInfo::current())
}

// --- Accounts ---

pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let request = json_body(body)?;
    blocking(move || accounts::signup(&state.database, &state.config, request, Utc::now()))
        .await
        .map(Json)
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let request = json_body(body)?;
    blocking(move || accounts::login(&state.database, &state.config, request, Utc::now()))
        .await
        .map(Json)
}

pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<SessionResponse>, AppError> {
    let token = require_token(bearer_token(&headers))?;
    blocking(move || accounts::refresh(&state.database, &state.config, &token, Utc::now()))
        .await
        .map(Json)
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, AppError> {
    let token = require_token(bearer_token(&headers))?;
    blocking(move || accounts::logout(&state.database, &token)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Food search ---

pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<FoodHit>>, AppError> {
    let query = query_param(query)?;
    foods::search_foods(state.search.as_ref(), query.food_name.as_deref())
        .await
        .map(Json)
}

// --- Logs ---

pub async fn list_logs(
    State(state): State<AppState>,
    query: Result<Query<EmailQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Json<Vec<LogEntry>>, AppError> {
    let query = query_param(query)?;
    let token = bearer_token(&headers);
    blocking(move || {
        let owner = authorized_owner(&state.database, token, query.email.as_deref())?;
        logs::list_logs(&state.database, Some(&owner))
    })
    .await
    .map(Json)
}

pub async fn add_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<AddLogRequest>, JsonRejection>,
) -> Result<Json<LogEntry>, AppError> {
    let request = json_body(body)?;
    let token = bearer_token(&headers);
    blocking(move || {
        authorized_owner(&state.database, token, request.user_email.as_deref())?;
        logs::add_log(&state.database, request)
    })
    .await
    .map(Json)
}

pub async fn delete_log(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let id = path_param(id)?;
    let token = require_token(bearer_token(&headers))?;
    blocking(move || {
        let session = accounts::current_session(&state.database, &token, Utc::now())?;
        logs::delete_log(&state.database, id, &session.user_email)
    })
    .await?;
    Ok((StatusCode::OK, "Deleted"))
}

pub async fn stats(
    State(state): State<AppState>,
    query: Result<Query<EmailQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Json<StatsSnapshot>, AppError> {
    let query = query_param(query)?;
    let token = bearer_token(&headers);
    blocking(move || {
        let owner = authorized_owner(&state.database, token, query.email.as_deref())?;
        stats::get_stats(&state.database, Some(&owner), &Local::now())
    })
    .await
    .map(Json)
}

pub async fn today(
    State(state): State<AppState>,
    query: Result<Query<EmailQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Json<DailySummary>, AppError> {
    let query = query_param(query)?;
    let token = bearer_token(&headers);
    blocking(move || {
        let owner = authorized_owner(&state.database, token, query.email.as_deref())?;
        stats::get_today_summary(&state.database, Some(&owner), &Local::now())
    })
    .await
    .map(Json)
}

// --- Goal ---

pub async fn get_goal(
    State(state): State<AppState>,
    query: Result<Query<EmailQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Json<GoalResponse>, AppError> {
    let query = query_param(query)?;
    let token = bearer_token(&headers);
    blocking(move || {
        let owner = authorized_owner(&state.database, token, query.email.as_deref())?;
        accounts::get_goal(&state.database, Some(&owner))
    })
    .await
    .map(Json)
}

pub async fn set_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SetGoalRequest>, JsonRejection>,
) -> Result<Json<GoalResponse>, AppError> {
    let request = json_body(body)?;
    let token = bearer_token(&headers);
    blocking(move || {
        authorized_owner(&state.database, token, request.email.as_deref())?;
        accounts::set_goal(&state.database, request)
    })
    .await
    .map(Json)
}
