//! Read-only user directory.

use std::path::Path;

use async_trait::async_trait;
use marketplace_core::types::DbId;

use crate::error::StoreError;
use crate::models::user::User;

/// Lookup operations the session layer needs from the user store.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user by username (case-sensitive).
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Find a user by internal id.
    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError>;
}

/// User directory backed by a JSON array loaded once at startup.
pub struct JsonUserDirectory {
    users: Vec<User>,
}

impl JsonUserDirectory {
    /// Build a directory from an already-loaded list of users.
    pub fn from_users(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Load the directory from a JSON file containing an array of users.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let raw = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path_str.clone(),
            source,
        })?;
        let users: Vec<User> = serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: path_str.clone(),
            source,
        })?;

        tracing::info!(count = users.len(), path = %path_str, "Loaded users");
        Ok(Self::from_users(users))
    }

    /// Number of users in the directory.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserDirectory for JsonUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }
}
