use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Path of the JSON user file (default: `database/users.json`).
    pub users_file: String,
    /// Seconds between expired-session sweeps (default: `3600`).
    pub session_sweep_interval_secs: u64,
    /// Token secrets and lifetimes.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `HOST`                        | `0.0.0.0`               |
    /// | `PORT`                        | `3000`                  |
    /// | `CORS_ORIGINS`                | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                    |
    /// | `USERS_FILE`                  | `database/users.json`   |
    /// | `SESSION_SWEEP_INTERVAL_SECS` | `3600`                  |
    ///
    /// Token settings are read by [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let users_file =
            std::env::var("USERS_FILE").unwrap_or_else(|_| "database/users.json".into());

        let session_sweep_interval_secs: u64 = std::env::var("SESSION_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("SESSION_SWEEP_INTERVAL_SECS must be a valid u64");
        assert!(
            session_sweep_interval_secs > 0,
            "SESSION_SWEEP_INTERVAL_SECS must be greater than zero"
        );

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            users_file,
            session_sweep_interval_secs,
            jwt,
        }
    }
}

/// Parse a token lifetime such as `30s`, `15m`, `1h`, or `7d` into seconds.
///
/// A bare number is taken as seconds. The value must be positive.
pub fn parse_expiry(raw: &str) -> Result<i64, String> {
    let raw = raw.trim();
    let (digits, unit_secs) = match raw.char_indices().last() {
        Some((idx, 's')) => (&raw[..idx], 1),
        Some((idx, 'm')) => (&raw[..idx], 60),
        Some((idx, 'h')) => (&raw[..idx], 3600),
        Some((idx, 'd')) => (&raw[..idx], 86_400),
        Some(_) => (raw, 1),
        None => return Err("value is empty".to_string()),
    };

    let amount: i64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a duration like 30s, 15m, 1h or 7d"))?;
    if amount <= 0 {
        return Err(format!("'{raw}' must be greater than zero"));
    }

    amount
        .checked_mul(unit_secs)
        .ok_or_else(|| format!("'{raw}' is too large"))
}
