use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub message: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// `running`, or `degraded` when the session store cannot be reached.
    pub status: &'static str,
    /// Refresh-token sessions currently held, including any not yet swept.
    pub active_sessions: Option<usize>,
}

/// GET / -- returns service and session store health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let active_sessions = state.sessions.session_count().await.ok();
    let status = if active_sessions.is_some() {
        "running"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        message: "Marketplace Backend API",
        version: env!("CARGO_PKG_VERSION"),
        status,
        active_sessions,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}
