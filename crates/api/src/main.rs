use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use marketplace_db::repositories::{InMemorySessionStore, JsonUserDirectory, SessionStore};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketplace_api::auth::jwt::TokenCodec;
use marketplace_api::auth::session::SessionService;
use marketplace_api::background::session_sweep;
use marketplace_api::config::ServerConfig;
use marketplace_api::router::build_app_router;
use marketplace_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        users_file = %config.users_file,
        access_ttl_secs = config.jwt.access_token_expiry_secs,
        refresh_ttl_secs = config.jwt.refresh_token_expiry_secs,
        "Loaded server configuration"
    );

    let users = JsonUserDirectory::load(&config.users_file).expect("Failed to load user file");
    if users.is_empty() {
        tracing::warn!(path = %config.users_file, "User file contains no users; every login will fail");
    }

    // Process-local: every refresh token is invalidated on restart.
    let session_store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

    let sessions = Arc::new(SessionService::new(
        Arc::new(users),
        Arc::clone(&session_store),
        TokenCodec::new(config.jwt.clone()),
    ));

    let sweep_cancel = CancellationToken::new();
    let sweeper = tokio::spawn(session_sweep::run(
        Arc::clone(&session_store),
        Duration::from_secs(config.session_sweep_interval_secs),
        sweep_cancel.clone(),
    ));

    let app = build_app_router(AppState { sessions }, &config);

    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "Marketplace API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    sweep_cancel.cancel();
    if tokio::time::timeout(Duration::from_secs(5), sweeper).await.is_err() {
        tracing::warn!("Session sweeper did not stop within 5s");
    }
    tracing::info!("Shutdown complete");
}

/// Install the global subscriber. `LOG_FORMAT=json` switches to one JSON
/// object per event; anything else keeps the human-readable format.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "marketplace_api=debug,marketplace_db=debug,tower_http=debug".into()
    });
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Resolve on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
