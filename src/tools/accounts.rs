//! Account, session and goal operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::db::Database;
use crate::error::AppError;
use crate::models::{normalize_email, Session, User, UserCreate};

use super::require_identifier;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetGoalRequest {
    pub email: Option<String>,
    pub daily_goal: Option<f64>,
}

/// Returned by signup, login and refresh
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalResponse {
    pub daily_goal: f64,
}

fn invalid_session() -> AppError {
    AppError::Unauthorized("Session expired or invalid".to_string())
}

fn require_password(raw: Option<String>) -> Result<String, AppError> {
    raw.filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::missing_param("password"))
}

/// Create an account and open a session for it
pub fn signup(
    db: &Database,
    config: &Config,
    request: SignupRequest,
    now: DateTime<Utc>,
) -> Result<SessionResponse, AppError> {
    let email = require_identifier(request.email.as_deref())?;
    let password = require_password(request.password)?;
    let conflict = || AppError::Conflict("An account with this email already exists".to_string());

    if db.with_conn(|conn| User::get_by_email(conn, &email))?.is_some() {
        return Err(conflict());
    }

    let data = UserCreate {
        name: request.name,
        email,
        password,
        daily_goal: config.default_daily_goal,
    };
    let user = match db.with_conn(|conn| User::create(conn, &data)) {
        Ok(user) => user,
        Err(e) if e.is_constraint_violation() => return Err(conflict()),
        Err(e) => return Err(e.into()),
    };

    let session = db.with_conn(|conn| Session::create(conn, &user.email, config.session_ttl(), now))?;
    info!(user_id = user.id, "Account created");

    Ok(SessionResponse {
        token: session.token,
        expires_at: session.expires_at,
        user,
    })
}

/// Check credentials and open a session
pub fn login(
    db: &Database,
    config: &Config,
    request: LoginRequest,
    now: DateTime<Utc>,
) -> Result<SessionResponse, AppError> {
    let email = require_identifier(request.email.as_deref())?;
    let password = require_password(request.password)?;

    let user = db
        .with_conn(|conn| User::authenticate(conn, &email, &password))?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let session = db.with_conn(|conn| Session::create(conn, &user.email, config.session_ttl(), now))?;
    info!(user_id = user.id, "Logged in");

    Ok(SessionResponse {
        token: session.token,
        expires_at: session.expires_at,
        user,
    })
}

/// Exchange an active token for a fresh one
pub fn refresh(db: &Database, config: &Config, token: &str, now: DateTime<Utc>) -> Result<SessionResponse, AppError> {
    let session = db
        .with_conn(|conn| Session::refresh(conn, token, config.session_ttl(), now))?
        .ok_or_else(invalid_session)?;

    let user = db
        .with_conn(|conn| User::get_by_email(conn, &session.user_email))?
        .ok_or_else(invalid_session)?;

    Ok(SessionResponse {
        token: session.token,
        expires_at: session.expires_at,
        user,
    })
}

pub fn logout(db: &Database, token: &str) -> Result<(), AppError> {
    db.with_conn(|conn| Session::revoke(conn, token))?;
    Ok(())
}

/// Resolve a bearer token to a session that belongs to `email`
pub fn authorize(db: &Database, token: &str, email: &str, now: DateTime<Utc>) -> Result<Session, AppError> {
    let session = db
        .with_conn(|conn| Session::get_active(conn, token, now))?
        .ok_or_else(invalid_session)?;

    if session.user_email != normalize_email(email) {
        return Err(AppError::Unauthorized(
            "Session does not belong to this account".to_string(),
        ));
    }

    Ok(session)
}

/// Resolve a bearer token to its session without an account check
pub fn current_session(db: &Database, token: &str, now: DateTime<Utc>) -> Result<Session, AppError> {
    db.with_conn(|conn| Session::get_active(conn, token, now))?
        .ok_or_else(invalid_session)
}

pub fn get_goal(db: &Database, email: Option<&str>) -> Result<GoalResponse, AppError> {
    let email = require_identifier(email)?;
    let user = db
        .with_conn(|conn| User::get_by_email(conn, &email))?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

    Ok(GoalResponse {
        daily_goal: user.daily_goal,
    })
}

pub fn set_goal(db: &Database, request: SetGoalRequest) -> Result<GoalResponse, AppError> {
    let email = require_identifier(request.email.as_deref())?;
    let daily_goal = request
        .daily_goal
        .ok_or_else(|| AppError::missing_param("dailyGoal"))?;
    if !(daily_goal.is_finite() && daily_goal > 0.0) {
        return Err(AppError::Validation("dailyGoal must be a positive number".to_string()));
    }

    let user = db
        .with_conn(|conn| User::set_daily_goal(conn, &email, daily_goal))?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

    Ok(GoalResponse {
        daily_goal: user.daily_goal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn signup_request(email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: Some("Ansh Gupta".into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn test_signup_then_login() {
        let db = Database::in_memory().unwrap();
        let config = Config::default();
        let now = Utc::now();

        let created = signup(&db, &config, signup_request("Ansh@Example.com", "pw1"), now).unwrap();
        assert_eq!(created.user.email, "ansh@example.com");
        assert_eq!(created.user.daily_goal, config.default_daily_goal);
        assert_eq!(created.expires_at, now + config.session_ttl());

        let session = login(&db, &config, login_request("ANSH@example.com", "pw1"), now).unwrap();
        assert_ne!(session.token, created.token);

        let bad = login(&db, &config, login_request("ansh@example.com", "nope"), now);
        assert!(matches!(bad, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_signup_rejects_duplicates_and_blanks() {
        let db = Database::in_memory().unwrap();
        let config = Config::default();
        signup(&db, &config, signup_request("a@x.com", "pw"), Utc::now()).unwrap();

        let dup = signup(&db, &config, signup_request("A@X.COM", "pw"), Utc::now());
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        let blank = signup(&db, &config, signup_request("b@x.com", ""), Utc::now());
        assert!(matches!(blank, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_authorize_checks_account_and_expiry() {
        let db = Database::in_memory().unwrap();
        let config = Config::default();
        let now = Utc::now();
        let created = signup(&db, &config, signup_request("a@x.com", "pw"), now).unwrap();

        authorize(&db, &created.token, "A@X.com", now).unwrap();

        let other = authorize(&db, &created.token, "b@x.com", now);
        assert!(matches!(other, Err(AppError::Unauthorized(_))));

        let expired = authorize(&db, &created.token, "a@x.com", now + config.session_ttl() + Duration::seconds(1));
        assert!(matches!(expired, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_refresh_and_logout() {
        let db = Database::in_memory().unwrap();
        let config = Config::default();
        let now = Utc::now();
        let created = signup(&db, &config, signup_request("a@x.com", "pw"), now).unwrap();

        let refreshed = refresh(&db, &config, &created.token, now + Duration::hours(1)).unwrap();
        assert_ne!(refreshed.token, created.token);
        assert!(current_session(&db, &created.token, now).is_err());

        logout(&db, &refreshed.token).unwrap();
        assert!(current_session(&db, &refreshed.token, now).is_err());
        assert!(matches!(refresh(&db, &config, &refreshed.token, now), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_goal_round_trip() {
        let db = Database::in_memory().unwrap();
        let config = Config::default();
        signup(&db, &config, signup_request("a@x.com", "pw"), Utc::now()).unwrap();

        assert_eq!(get_goal(&db, Some("a@x.com")).unwrap().daily_goal, 2000.0);

        let updated = set_goal(
            &db,
            SetGoalRequest {
                email: Some("A@x.com".into()),
                daily_goal: Some(1750.0),
            },
        )
        .unwrap();
        assert_eq!(updated.daily_goal, 1750.0);

        let invalid = set_goal(
            &db,
            SetGoalRequest {
                email: Some("a@x.com".into()),
                daily_goal: Some(0.0),
            },
        );
        assert!(matches!(invalid, Err(AppError::Validation(_))));
    }
}
