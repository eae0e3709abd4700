//! Refresh-token session model and DTOs.

use marketplace_core::types::{DbId, Timestamp};

/// A registered refresh token and the client it is bound to.
///
/// Keyed in the store by `token_hash`, the SHA-256 hex digest of the
/// refresh token. A record is never updated in place: rotation removes it
/// and registers a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token_hash: String,
    pub user_id: DbId,
    pub ip_address: String,
    pub device_id: String,
    pub expires_at: Timestamp,
}

impl SessionRecord {
    /// A record is expired once `expires_at` lies strictly before `now`.
    /// Used by the sweeper.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at < now
    }

    /// A record is live only while `expires_at` is still in the future.
    /// At `expires_at == now` it is neither live nor yet sweepable.
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        self.expires_at > now
    }

    /// Whether the record was issued to this exact IP address and device.
    pub fn is_bound_to(&self, ip_address: &str, device_id: &str) -> bool {
        self.ip_address == ip_address && self.device_id == device_id
    }
}

/// DTO for registering a new session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub token_hash: String,
    pub user_id: DbId,
    pub ip_address: String,
    pub device_id: String,
    pub expires_at: Timestamp,
}

impl From<NewSession> for SessionRecord {
    fn from(input: NewSession) -> Self {
        Self {
            token_hash: input.token_hash,
            user_id: input.user_id,
            ip_address: input.ip_address,
            device_id: input.device_id,
            expires_at: input.expires_at,
        }
    }
}
