//! Access- and refresh-token signing and verification.
//!
//! Both token classes are HS256-signed JWTs. Each uses its own secret and
//! carries a `typ` claim naming its class, so an access token can never be
//! presented as a refresh token or the other way round. Verification is stateless: a refresh token that verifies here may
//! still be rejected because its session was revoked.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use marketplace_core::types::DbId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Default signing secret for access tokens.
pub const DEFAULT_ACCESS_SECRET: &str = "access-secret";
/// Default signing secret for refresh tokens.
pub const DEFAULT_REFRESH_SECRET: &str = "refresh-secret";
/// Default access token lifetime: 1 hour.
const DEFAULT_ACCESS_EXPIRY_SECS: i64 = 60 * 60;
/// Default refresh token lifetime: 7 days.
const DEFAULT_REFRESH_EXPIRY_SECS: i64 = 7 * 24 * 60 * 60;

/// Identity claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    pub user_id: DbId,
    pub username: String,
    pub email: String,
}

/// Claims carried by a refresh token: the identity plus the client it was
/// issued to. The session store, not these claims, is authoritative for
/// binding checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPayload {
    #[serde(flatten)]
    pub user: TokenPayload,
    pub ip_address: String,
    pub device_id: String,
}

/// Token class, carried in the `typ` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TokenKind {
    Access,
    Refresh,
}

/// Wire form of a token: the payload plus registered claims.
#[derive(Debug, Serialize, Deserialize)]
struct Claims<T> {
    #[serde(flatten)]
    payload: T,
    typ: TokenKind,
    /// Expiration time (UTC Unix timestamp).
    exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    iat: i64,
    /// Unique token identifier, so tokens minted in the same second differ.
    jti: String,
}

/// Errors produced by [`TokenCodec`].
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("Invalid or expired token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("Token is not of the expected class")]
    WrongKind,
}

/// Configuration for token signing and lifetimes.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret for access tokens.
    pub access_secret: String,
    /// HMAC-SHA256 secret for refresh tokens. Must differ from `access_secret`.
    pub refresh_secret: String,
    /// Access token lifetime in seconds (default: 1 hour).
    pub access_token_expiry_secs: i64,
    /// Refresh token lifetime in seconds (default: 7 days).
    pub refresh_token_expiry_secs: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: DEFAULT_ACCESS_SECRET.to_string(),
            refresh_secret: DEFAULT_REFRESH_SECRET.to_string(),
            access_token_expiry_secs: DEFAULT_ACCESS_EXPIRY_SECS,
            refresh_token_expiry_secs: DEFAULT_REFRESH_EXPIRY_SECS,
        }
    }
}

impl JwtConfig {
    /// Load token configuration from environment variables.
    ///
    /// | Env Var              | Default          |
    /// |----------------------|------------------|
    /// | `JWT_ACCESS_SECRET`  | `access-secret`  |
    /// | `JWT_REFRESH_SECRET` | `refresh-secret` |
    /// | `JWT_ACCESS_EXPIRY`  | `1h`             |
    /// | `JWT_REFRESH_EXPIRY` | `7d`             |
    ///
    /// Expiry values take a number with an optional `s`, `m`, `h` or `d`
    /// suffix (see [`crate::config::parse_expiry`]).
    ///
    /// # Panics
    ///
    /// Panics if an expiry value cannot be parsed, if a secret is empty, or if
    /// both secrets are the same.
    pub fn from_env() -> Self {
        let access_secret = std::env::var("JWT_ACCESS_SECRET")
            .unwrap_or_else(|_| DEFAULT_ACCESS_SECRET.to_string());
        let refresh_secret = std::env::var("JWT_REFRESH_SECRET")
            .unwrap_or_else(|_| DEFAULT_REFRESH_SECRET.to_string());
        if access_secret == DEFAULT_ACCESS_SECRET || refresh_secret == DEFAULT_REFRESH_SECRET {
            tracing::warn!("Using a built-in JWT secret; set JWT_ACCESS_SECRET and JWT_REFRESH_SECRET");
        }

        let access_token_expiry_secs = expiry_from_env("JWT_ACCESS_EXPIRY", "1h");
        let refresh_token_expiry_secs = expiry_from_env("JWT_REFRESH_EXPIRY", "7d");

        let config = Self {
            access_secret,
            refresh_secret,
            access_token_expiry_secs,
            refresh_token_expiry_secs,
        };
        if let Err(e) = config.validate() {
            panic!("Invalid JWT configuration: {e}");
        }
        config
    }

    /// Check that both secrets are set and that they differ.
    pub fn validate(&self) -> Result<(), String> {
        if self.access_secret.is_empty() {
            return Err("JWT_ACCESS_SECRET must not be empty".to_string());
        }
        if self.refresh_secret.is_empty() {
            return Err("JWT_REFRESH_SECRET must not be empty".to_string());
        }
        if self.access_secret == self.refresh_secret {
            return Err("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ".to_string());
        }
        Ok(())
    }
}

fn expiry_from_env(var: &str, default: &str) -> i64 {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    crate::config::parse_expiry(&raw).unwrap_or_else(|e| panic!("{var} is invalid: {e}"))
}

/// Signs and verifies access and refresh tokens.
#[derive(Clone)]
pub struct TokenCodec {
    config: JwtConfig,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Build a codec from `config`.
    ///
    /// # Panics
    ///
    /// Panics if [`JwtConfig::validate`] rejects the configuration.
    pub fn new(config: JwtConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("Invalid JWT configuration: {e}");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            validation,
            config,
        }
    }

    /// Access token lifetime in seconds.
    pub fn access_token_expiry_secs(&self) -> i64 {
        self.config.access_token_expiry_secs
    }

    /// Refresh token lifetime in seconds.
    pub fn refresh_token_expiry_secs(&self) -> i64 {
        self.config.refresh_token_expiry_secs
    }

    pub fn issue_access_token(&self, payload: &TokenPayload) -> Result<String, TokenError> {
        sign(
            payload,
            TokenKind::Access,
            self.config.access_token_expiry_secs,
            &self.access_encoding,
        )
    }

    pub fn issue_refresh_token(&self, payload: &RefreshPayload) -> Result<String, TokenError> {
        sign(
            payload,
            TokenKind::Refresh,
            self.config.refresh_token_expiry_secs,
            &self.refresh_encoding,
        )
    }

    /// Validate an access token's signature and expiry and return its claims.
    pub fn verify_access_token(&self, token: &str) -> Result<TokenPayload, TokenError> {
        verify(token, TokenKind::Access, &self.access_decoding, &self.validation)
    }

    /// Validate a refresh token's signature and expiry and return its claims.
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshPayload, TokenError> {
        verify(token, TokenKind::Refresh, &self.refresh_decoding, &self.validation)
    }
}

fn sign<T: Serialize>(
    payload: &T,
    kind: TokenKind,
    lifetime_secs: i64,
    key: &EncodingKey,
) -> Result<String, TokenError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        payload,
        typ: kind,
        exp: now + lifetime_secs,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(&Header::default(), &claims, key).map_err(TokenError::Signing)
}

fn verify<T: DeserializeOwned>(
    token: &str,
    expected: TokenKind,
    key: &DecodingKey,
    validation: &Validation,
) -> Result<T, TokenError> {
    let data = decode::<Claims<T>>(token, key, validation).map_err(TokenError::Invalid)?;
    if data.claims.typ != expected {
        return Err(TokenError::WrongKind);
    }
    Ok(data.claims.payload)
}

/// Compute the SHA-256 hex digest of a refresh token.
///
/// The session store is keyed by this digest, never by the token itself.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
