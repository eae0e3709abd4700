pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /auth/login                                      login (public)
/// /auth/refresh                                    rotate refresh token (public)
/// /auth/logout                                     revoke refresh token (public)
/// /auth/logout-all                                 revoke all sessions (requires auth)
/// /auth/me                                         current user profile (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/auth", auth::router())
}
