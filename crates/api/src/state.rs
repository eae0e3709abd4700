use std::sync::Arc;

use crate::auth::session::SessionService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Login, refresh, and logout orchestration.
    pub sessions: Arc<SessionService>,
}
