//! Periodic purge of expired refresh-token sessions.
//!
//! Lookups already drop expired sessions lazily, so this job only bounds
//! memory held by tokens that are never presented again. A failed or late
//! pass never changes whether a token is accepted.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use marketplace_core::types::Timestamp;
use marketplace_db::repositories::SessionStore;
use marketplace_db::StoreError;
use tokio_util::sync::CancellationToken;

/// Remove every session that expired strictly before `now`.
///
/// Returns the number of sessions removed. Safe to repeat.
pub async fn sweep_once(store: &dyn SessionStore, now: Timestamp) -> Result<u64, StoreError> {
    store.purge_expired(now).await
}

/// Run the session sweep loop.
///
/// The first pass runs immediately, then once per `interval`, until `cancel`
/// is triggered.
pub async fn run(store: Arc<dyn SessionStore>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Session sweep job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session sweep job stopping");
                break;
            }
            _ = ticker.tick() => {
                match sweep_once(store.as_ref(), Utc::now()).await {
                    Ok(purged) => {
                        if purged > 0 {
                            tracing::info!(purged, "Session sweep: purged expired sessions");
                        } else {
                            tracing::debug!("Session sweep: nothing to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Session sweep: purge failed");
                    }
                }
            }
        }
    }
}
