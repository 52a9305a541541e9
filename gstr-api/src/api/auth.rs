//! Dashboard login and signup
//!
//! Failures are reported in the body (`success: false`) rather than through
//! the status code; the dashboard shows the message as-is.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use gstr_common::db::users;
use gstr_common::models::User;
use gstr_common::Error;

use crate::{ApiResult, AppState};

const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthResponse {
    fn ok(user: User) -> Self {
        Self {
            success: true,
            user: Some(user),
            error: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            user: None,
            error: Some(message.into()),
        }
    }
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(creds): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    match users::authenticate(&state.db, &creds.email, &creds.password).await? {
        Some(user) => {
            info!(email = %user.email, "User logged in");
            Ok(Json(AuthResponse::ok(user)))
        }
        None => Ok(Json(AuthResponse::failed("Invalid email or password"))),
    }
}

/// POST /api/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(data): Json<SignupRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let created_at = chrono::Local::now().format("%Y-%m-%d").to_string();
    let result = users::create_user(
        &state.db,
        &data.email,
        &data.password,
        &data.name,
        DEFAULT_ROLE,
        &created_at,
    )
    .await;

    match result {
        Ok(user) => {
            info!(email = %user.email, "User registered");
            Ok(Json(AuthResponse::ok(user)))
        }
        Err(Error::InvalidInput(msg)) => Ok(Json(AuthResponse::failed(msg))),
        Err(e) => Err(e.into()),
    }
}
