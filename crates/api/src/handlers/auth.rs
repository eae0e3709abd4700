//! Handlers for the `/auth` resource (login, refresh, logout, profile).

use axum::extract::State;
use axum::Json;
use marketplace_core::error::CoreError;
use marketplace_db::models::user::UserProfile;
use serde::{Deserialize, Serialize};

use crate::auth::session::{LoginInput, RefreshInput, TokenPair};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub device_id: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub device_id: String,
}

/// Request body for `POST /auth/logout`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Response for `POST /auth/login`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserProfile,
}

/// Response for `POST /auth/refresh`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Response for `POST /auth/logout`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub message: &'static str,
    /// Whether a live session was found and revoked.
    pub token_found: bool,
}

/// Response for `POST /auth/logout-all`.
#[derive(Debug, Serialize)]
pub struct LogoutAllResponse {
    pub revoked: u64,
}

/// Response for `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: UserProfile,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/login
///
/// Authenticate with username + password. The refresh token is bound to the
/// supplied IP address and device id.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    require_fields(&[
        ("username", input.username.as_str()),
        ("password", input.password.as_str()),
        ("ipAddress", input.ip_address.as_str()),
        ("deviceId", input.device_id.as_str()),
    ])?;

    let outcome = state
        .sessions
        .login(LoginInput {
            username: input.username,
            password: input.password,
            ip_address: input.ip_address,
            device_id: input.device_id,
        })
        .await?;

    Ok(Json(LoginResponse {
        access_token: outcome.tokens.access_token,
        refresh_token: outcome.tokens.refresh_token,
        expires_in: state.sessions.codec().access_token_expiry_secs(),
        user: outcome.user,
    }))
}

/// POST /api/auth/refresh
///
/// Exchange a refresh token for a new access + refresh pair. The presented
/// token is consumed.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    require_fields(&[
        ("refreshToken", input.refresh_token.as_str()),
        ("ipAddress", input.ip_address.as_str()),
        ("deviceId", input.device_id.as_str()),
    ])?;

    let TokenPair {
        access_token,
        refresh_token,
    } = state
        .sessions
        .refresh(RefreshInput {
            refresh_token: input.refresh_token,
            ip_address: input.ip_address,
            device_id: input.device_id,
        })
        .await?;

    Ok(Json(RefreshResponse {
        access_token,
        refresh_token,
        expires_in: state.sessions.codec().access_token_expiry_secs(),
    }))
}

/// POST /api/auth/logout
///
/// Revoke a refresh token. Succeeds whether or not the token was still live.
pub async fn logout(
    State(state): State<AppState>,
    Json(input): Json<LogoutRequest>,
) -> AppResult<Json<LogoutResponse>> {
    require_fields(&[("refreshToken", input.refresh_token.as_str())])?;

    let outcome = state.sessions.logout(&input.refresh_token).await?;

    Ok(Json(LogoutResponse {
        message: "Logged out successfully",
        token_found: outcome.found,
    }))
}

/// POST /api/auth/logout-all
///
/// Revoke every session of the authenticated user.
pub async fn logout_all(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<LogoutAllResponse>> {
    let revoked = state.sessions.logout_everywhere(auth_user.user_id).await?;
    tracing::debug!(username = %auth_user.username, revoked, "Logged out everywhere");
    Ok(Json(LogoutAllResponse { revoked }))
}

/// GET /api/auth/me
///
/// Profile of the authenticated user.
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state.sessions.profile(auth_user.user_id).await?;
    Ok(Json(ProfileResponse {
        success: true,
        data: profile,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reject the request if any required field is blank, naming every missing one.
fn require_fields(fields: &[(&str, &str)]) -> AppResult<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    Err(AppError::Core(CoreError::Validation(format!(
        "Missing required fields: {}",
        missing.join(", ")
    ))))
}
