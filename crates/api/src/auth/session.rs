//! Login, refresh-token rotation, and logout.
//!
//! [`SessionService`] is the only component that combines credential checks,
//! token minting, and session-store mutation. Refresh tokens move through a
//! one-way lifecycle: issued, then rotated, revoked, or expired, and never
//! honoured again afterwards.
//!
//! Refresh checks run in two tiers. The token's signature and expiry are
//! verified first without touching the store; only then is the session
//! record consulted for revocation and client binding. Binding is checked
//! against the store's record, not the token's embedded claims.

use std::sync::Arc;

use chrono::Utc;
use marketplace_core::types::DbId;
use marketplace_db::models::session::NewSession;
use marketplace_db::models::user::UserProfile;
use marketplace_db::repositories::{SessionStore, UserDirectory};
use marketplace_db::StoreError;

use crate::auth::jwt::{hash_refresh_token, RefreshPayload, TokenCodec, TokenPayload};
use crate::auth::password::{burn_verification, verify_password};

/// Errors returned by [`SessionService`] operations.
///
/// None of these are retried internally; the route layer maps each to a
/// response.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Unknown username or wrong password. The two are deliberately
    /// indistinguishable.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The token failed signature or expiry verification.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The refresh token verified but has no live session (rotated, revoked,
    /// or expired).
    #[error("Refresh token not found or expired")]
    UnknownSession,

    /// The refresh token was presented from a different IP address or device
    /// than it was issued to. The session has already been revoked.
    #[error("IP address or device ID mismatch")]
    SessionTheftSuspected,

    /// The user referenced by a valid token no longer exists.
    #[error("User {0} not found")]
    UserNotFound(DbId),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

/// Input for [`SessionService::login`].
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
    pub ip_address: String,
    pub device_id: String,
}

/// Input for [`SessionService::refresh`].
#[derive(Debug, Clone)]
pub struct RefreshInput {
    pub refresh_token: String,
    pub ip_address: String,
    pub device_id: String,
}

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub tokens: TokenPair,
    pub user: UserProfile,
}

/// Result of a logout. `found` reports whether a live session was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoutOutcome {
    pub found: bool,
}

/// Orchestrates the token/session lifecycle.
pub struct SessionService {
    users: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionStore>,
    codec: TokenCodec,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionStore>,
        codec: TokenCodec,
    ) -> Self {
        Self {
            users,
            sessions,
            codec,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Authenticate with username and password and open a session bound to
    /// the caller's IP address and device.
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutcome, SessionError> {
        let Some(user) = self.users.find_by_username(&input.username).await? else {
            burn_verification(&input.password);
            return Err(SessionError::InvalidCredentials);
        };

        let password_valid = verify_password(&input.password, &user.password_hash)
            .map_err(|e| SessionError::Internal(format!("Password verification error: {e}")))?;
        if !password_valid {
            tracing::debug!(user_id = user.id, "Login rejected: wrong password");
            return Err(SessionError::InvalidCredentials);
        }

        let identity = TokenPayload {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        };
        let tokens = self
            .open_session(identity, input.ip_address, input.device_id)
            .await?;

        tracing::info!(user_id = user.id, "User logged in");

        Ok(LoginOutcome {
            tokens,
            user: UserProfile::from(&user),
        })
    }

    /// Exchange a refresh token for a new access/refresh pair.
    ///
    /// The presented token is consumed: replaying it afterwards fails with
    /// [`SessionError::UnknownSession`]. A binding mismatch revokes the
    /// session before the error is returned.
    pub async fn refresh(&self, input: RefreshInput) -> Result<TokenPair, SessionError> {
        let claims = self
            .codec
            .verify_refresh_token(&input.refresh_token)
            .map_err(|_| SessionError::InvalidToken)?;

        let token_hash = hash_refresh_token(&input.refresh_token);
        let record = self
            .sessions
            .lookup(&token_hash)
            .await?
            .ok_or(SessionError::UnknownSession)?;

        if !record.is_bound_to(&input.ip_address, &input.device_id) {
            self.sessions.revoke(&token_hash).await?;
            tracing::warn!(
                user_id = record.user_id,
                ip_address = %input.ip_address,
                device_id = %input.device_id,
                "Refresh token presented from an unbound client; session revoked"
            );
            return Err(SessionError::SessionTheftSuspected);
        }

        // A concurrent refresh of the same token may have consumed it between
        // lookup and here; only the caller that actually removed it proceeds.
        if !self.sessions.revoke(&token_hash).await? {
            return Err(SessionError::UnknownSession);
        }

        let tokens = self
            .open_session(claims.user, input.ip_address, input.device_id)
            .await?;

        tracing::debug!(user_id = record.user_id, "Refresh token rotated");
        Ok(tokens)
    }

    /// Revoke a refresh token. Unknown or already consumed tokens are not an
    /// error.
    pub async fn logout(&self, refresh_token: &str) -> Result<LogoutOutcome, SessionError> {
        let found = self
            .sessions
            .revoke(&hash_refresh_token(refresh_token))
            .await?;
        Ok(LogoutOutcome { found })
    }

    /// Revoke every session belonging to a user. Returns the count revoked.
    pub async fn logout_everywhere(&self, user_id: DbId) -> Result<u64, SessionError> {
        let revoked = self.sessions.revoke_all_for_user(user_id).await?;
        tracing::info!(user_id, revoked, "Revoked all sessions for user");
        Ok(revoked)
    }

    /// Verify an access token and return its identity claims.
    pub fn authenticate(&self, access_token: &str) -> Result<TokenPayload, SessionError> {
        self.codec
            .verify_access_token(access_token)
            .map_err(|_| SessionError::InvalidToken)
    }

    /// Public profile of a user.
    pub async fn profile(&self, user_id: DbId) -> Result<UserProfile, SessionError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(SessionError::UserNotFound(user_id))?;
        Ok(UserProfile::from(&user))
    }

    /// Number of sessions currently held by the store.
    pub async fn session_count(&self) -> Result<usize, SessionError> {
        Ok(self.sessions.count().await?)
    }

    /// Mint a token pair and register the refresh token with an expiry
    /// counted from now.
    async fn open_session(
        &self,
        identity: TokenPayload,
        ip_address: String,
        device_id: String,
    ) -> Result<TokenPair, SessionError> {
        let access_token = self
            .codec
            .issue_access_token(&identity)
            .map_err(|e| SessionError::Internal(format!("Token generation error: {e}")))?;

        let user_id = identity.user_id;
        let refresh_payload = RefreshPayload {
            user: identity,
            ip_address,
            device_id,
        };
        let refresh_token = self
            .codec
            .issue_refresh_token(&refresh_payload)
            .map_err(|e| SessionError::Internal(format!("Token generation error: {e}")))?;

        let expires_at =
            Utc::now() + chrono::Duration::seconds(self.codec.refresh_token_expiry_secs());

        self.sessions
            .register(NewSession {
                token_hash: hash_refresh_token(&refresh_token),
                user_id,
                ip_address: refresh_payload.ip_address,
                device_id: refresh_payload.device_id,
                expires_at,
            })
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use marketplace_db::models::user::User;
    use marketplace_db::repositories::{InMemorySessionStore, JsonUserDirectory};

    use super::*;
    use crate::auth::jwt::JwtConfig;
    use crate::auth::password::hash_password;

    struct Harness {
        service: SessionService,
        sessions: Arc<InMemorySessionStore>,
    }

    fn harness() -> Harness {
        let alice = User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            password_hash: hash_password("secret").expect("hashing should succeed"),
        };
        let users = Arc::new(JsonUserDirectory::from_users(vec![alice]));
        let sessions = Arc::new(InMemorySessionStore::new());
        let service = SessionService::new(
            users,
            sessions.clone(),
            TokenCodec::new(JwtConfig::default()),
        );
        Harness { service, sessions }
    }

    fn login_input(username: &str, password: &str) -> LoginInput {
        LoginInput {
            username: username.to_string(),
            password: password.to_string(),
            ip_address: "1.1.1.1".to_string(),
            device_id: "dev-A".to_string(),
        }
    }

    fn refresh_input(token: &str, ip_address: &str, device_id: &str) -> RefreshInput {
        RefreshInput {
            refresh_token: token.to_string(),
            ip_address: ip_address.to_string(),
            device_id: device_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_tokens() {
        let h = harness();
        let outcome = h.service.login(login_input("alice", "secret")).await.unwrap();

        let claims = h.service.authenticate(&outcome.tokens.access_token).unwrap();
        assert_eq!(claims.user_id, 1);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");

        assert_eq!(outcome.user.first_name, "Alice");
        assert_eq!(h.sessions.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_login_registers_binding_and_expiry() {
        let h = harness();
        let before = Utc::now();
        let outcome = h.service.login(login_input("alice", "secret")).await.unwrap();

        let record = h
            .sessions
            .lookup(&hash_refresh_token(&outcome.tokens.refresh_token))
            .await
            .unwrap()
            .expect("refresh token must be registered");
        assert_eq!(record.user_id, 1);
        assert_eq!(record.ip_address, "1.1.1.1");
        assert_eq!(record.device_id, "dev-A");
        assert!(record.expires_at >= before + chrono::Duration::days(7));
        assert!(record.expires_at <= Utc::now() + chrono::Duration::days(7));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let h = harness();

        let wrong_password = h.service.login(login_input("alice", "nope")).await.unwrap_err();
        let unknown_user = h.service.login(login_input("mallory", "secret")).await.unwrap_err();

        assert_matches!(wrong_password, SessionError::InvalidCredentials);
        assert_matches!(unknown_user, SessionError::InvalidCredentials);
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert_eq!(h.sessions.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_refresh_rotates_exactly_once() {
        let h = harness();
        let r1 = h
            .service
            .login(login_input("alice", "secret"))
            .await
            .unwrap()
            .tokens
            .refresh_token;

        let pair = h
            .service
            .refresh(refresh_input(&r1, "1.1.1.1", "dev-A"))
            .await
            .unwrap();
        assert_ne!(pair.refresh_token, r1);
        assert!(h.service.authenticate(&pair.access_token).is_ok());

        let replay = h.service.refresh(refresh_input(&r1, "1.1.1.1", "dev-A")).await;
        assert_matches!(replay, Err(SessionError::UnknownSession));
        assert_eq!(h.sessions.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_refresh_binding_mismatch_revokes() {
        let h = harness();
        let r1 = h
            .service
            .login(login_input("alice", "secret"))
            .await
            .unwrap()
            .tokens
            .refresh_token;

        let other_device = h.service.refresh(refresh_input(&r1, "1.1.1.1", "dev-B")).await;
        assert_matches!(other_device, Err(SessionError::SessionTheftSuspected));

        // The legitimate client is locked out too.
        let original = h.service.refresh(refresh_input(&r1, "1.1.1.1", "dev-A")).await;
        assert_matches!(original, Err(SessionError::UnknownSession));
        assert_eq!(h.sessions.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_refresh_rejects_unverifiable_token_without_store_access() {
        let h = harness();
        h.service.login(login_input("alice", "secret")).await.unwrap();

        let result = h.service.refresh(refresh_input("garbage", "1.1.1.1", "dev-A")).await;
        assert_matches!(result, Err(SessionError::InvalidToken));
        assert_eq!(h.sessions.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_refresh_token() {
        let h = harness();
        let access = h
            .service
            .login(login_input("alice", "secret"))
            .await
            .unwrap()
            .tokens
            .access_token;

        let result = h.service.refresh(refresh_input(&access, "1.1.1.1", "dev-A")).await;
        assert_matches!(result, Err(SessionError::InvalidToken));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let h = harness();
        let r1 = h
            .service
            .login(login_input("alice", "secret"))
            .await
            .unwrap()
            .tokens
            .refresh_token;

        assert_eq!(h.service.logout(&r1).await.unwrap(), LogoutOutcome { found: true });
        assert_eq!(h.service.logout(&r1).await.unwrap(), LogoutOutcome { found: false });
        assert_eq!(
            h.service.logout("never-issued").await.unwrap(),
            LogoutOutcome { found: false }
        );

        let result = h.service.refresh(refresh_input(&r1, "1.1.1.1", "dev-A")).await;
        assert_matches!(result, Err(SessionError::UnknownSession));
    }

    #[tokio::test]
    async fn test_logout_everywhere_revokes_all_sessions() {
        let h = harness();
        for _ in 0..3 {
            h.service.login(login_input("alice", "secret")).await.unwrap();
        }

        assert_eq!(h.service.logout_everywhere(1).await.unwrap(), 3);
        assert_eq!(h.sessions.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_profile_lookup() {
        let h = harness();
        let profile = h.service.profile(1).await.unwrap();
        assert_eq!(profile.username, "alice");

        assert_matches!(h.service.profile(99).await, Err(SessionError::UserNotFound(99)));
    }

    #[tokio::test]
    async fn test_rotation_scenario() {
        let h = harness();

        let login = h.service.login(login_input("alice", "secret")).await.unwrap();
        let r1 = login.tokens.refresh_token;

        let r2 = h
            .service
            .refresh(refresh_input(&r1, "1.1.1.1", "dev-A"))
            .await
            .unwrap()
            .refresh_token;
        assert_ne!(r1, r2);

        assert_matches!(
            h.service.refresh(refresh_input(&r1, "1.1.1.1", "dev-A")).await,
            Err(SessionError::UnknownSession)
        );
        assert_matches!(
            h.service.refresh(refresh_input(&r2, "9.9.9.9", "dev-A")).await,
            Err(SessionError::SessionTheftSuspected)
        );
        assert_matches!(
            h.service.refresh(refresh_input(&r2, "1.1.1.1", "dev-A")).await,
            Err(SessionError::UnknownSession)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refreshes_yield_one_successor() {
        const ROUNDS: usize = 20;
        const CONTENDERS: usize = 8;

        let h = harness();
        let service = Arc::new(h.service);

        for round in 0..ROUNDS {
            let outcome = service.login(login_input("alice", "secret")).await.unwrap();
            let token = outcome.tokens.refresh_token;

            let handles: Vec<_> = (0..CONTENDERS)
                .map(|_| {
                    let service = Arc::clone(&service);
                    let token = token.clone();
                    tokio::spawn(async move {
                        service
                            .refresh(refresh_input(&token, "1.1.1.1", "dev-A"))
                            .await
                    })
                })
                .collect();

            let mut successes = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => successes += 1,
                    Err(e) => assert_matches!(e, SessionError::UnknownSession),
                }
            }
            assert_eq!(successes, 1, "round {round}: exactly one refresh must win");
        }

        // One live successor per login.
        assert_eq!(h.sessions.count().await.unwrap(), ROUNDS);
    }
}
