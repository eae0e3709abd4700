//! Registry of refresh-token sessions.
//!
//! The store is the source of truth for which refresh tokens may still be
//! exchanged. A token that is cryptographically valid but has no record here
//! is not honoured.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use marketplace_core::types::{DbId, Timestamp};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::models::session::{NewSession, SessionRecord};

/// Storage operations for refresh-token sessions.
///
/// Every method is a single atomic step with respect to the others.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a session, replacing any record with the same token hash.
    async fn register(&self, input: NewSession) -> Result<(), StoreError>;

    /// Find a live session by token hash.
    ///
    /// A record whose expiry is not in the future is deleted and reported as
    /// absent.
    async fn lookup(&self, token_hash: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Delete a single session. Returns `true` if a record was removed.
    async fn revoke(&self, token_hash: &str) -> Result<bool, StoreError>;

    /// Delete every session owned by a user. Returns the count removed.
    async fn revoke_all_for_user(&self, user_id: DbId) -> Result<u64, StoreError>;

    /// Delete sessions that expired strictly before `cutoff`. Returns the count removed.
    async fn purge_expired(&self, cutoff: Timestamp) -> Result<u64, StoreError>;

    /// Number of records currently held, live or not yet swept.
    async fn count(&self) -> Result<usize, StoreError>;
}

/// Process-local session store.
///
/// Starts empty and lives for the lifetime of the process; a restart
/// invalidates every outstanding refresh token.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

impl InMemorySessionStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn register(&self, input: NewSession) -> Result<(), StoreError> {
        let record = SessionRecord::from(input);
        self.sessions
            .lock()
            .await
            .insert(record.token_hash.clone(), record);
        Ok(())
    }

    async fn lookup(&self, token_hash: &str) -> Result<Option<SessionRecord>, StoreError> {
        let mut sessions = self.sessions.lock().await;

        let expired = match sessions.get(token_hash) {
            None => return Ok(None),
            Some(record) => !record.is_live_at(Utc::now()),
        };

        if expired {
            sessions.remove(token_hash);
            tracing::debug!("Dropped expired session on lookup");
            return Ok(None);
        }

        Ok(sessions.get(token_hash).cloned())
    }

    async fn revoke(&self, token_hash: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.lock().await.remove(token_hash).is_some())
    }

    async fn revoke_all_for_user(&self, user_id: DbId) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, record| record.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn purge_expired(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired_at(cutoff));
        Ok((before - sessions.len()) as u64)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.sessions.lock().await.len())
    }
}
