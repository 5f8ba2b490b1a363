//! Authentication Configuration
//!
//! All configuration values are loaded from environment variables.
//! The signing secret is never hardcoded; it is read once and handed to the
//! token issuer at construction.

use crate::error::AuthError;
use crate::lookup::{TokenLookup, DEFAULT_TOKEN_HEAD_NAME, DEFAULT_TOKEN_LOOKUP};

use argon2::Params;
use std::env;

/// Upper bound for `JWT_TIMEOUT` and `JWT_MAX_REFRESH`: ten years
pub const MAX_TOKEN_WINDOW: i64 = 10 * 365 * 24 * 60 * 60;

/// Authentication configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT secret key for signing tokens (from JWT_SECRET env var)
    pub jwt_secret: String,

    /// JWT issuer (from JWT_ISSUER env var)
    pub jwt_issuer: String,

    /// Token lifetime in seconds (from JWT_TIMEOUT env var)
    pub token_timeout: i64,

    /// Grace period after expiry during which a token may still be refreshed,
    /// in seconds (from JWT_MAX_REFRESH env var)
    pub max_refresh: i64,

    /// Where to look for the token on incoming requests
    /// (from TOKEN_LOOKUP and TOKEN_HEAD_NAME env vars)
    pub token_lookup: TokenLookup,

    /// Also hand out the token as a cookie on login and refresh (from SEND_COOKIE env var)
    pub send_cookie: bool,

    /// Cookie name used when SEND_COOKIE is on (from COOKIE_NAME env var)
    pub cookie_name: String,

    /// Mark the token cookie as Secure (from SECURE_COOKIE env var)
    pub secure_cookie: bool,

    /// Identity treated as the admin account (from ADMIN_IDENTITY env var)
    pub admin_identity: Option<String>,

    /// Argon2 memory cost in KiB (from ARGON2_MEMORY_COST env var)
    pub argon2_memory_cost: u32,

    /// Argon2 time cost (iterations) (from ARGON2_TIME_COST env var)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (from ARGON2_PARALLELISM env var)
    pub argon2_parallelism: u32,
}

impl AuthConfig {
    /// Configuration with default values for everything but the secret
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_issuer: "qiyetalk".to_string(),
            token_timeout: 3600, // 1 hour
            max_refresh: 3600,   // 1 hour past expiry
            token_lookup: TokenLookup::default(),
            send_cookie: false,
            cookie_name: "jwt".to_string(),
            secure_cookie: false,
            admin_identity: None,
            argon2_memory_cost: 65536, // 64 MiB
            argon2_time_cost: 3,
            argon2_parallelism: 4,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AuthError> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AuthError::Config("JWT_SECRET environment variable must be set".into()))?;

        let defaults = Self::new(jwt_secret);

        let token_lookup = env::var("TOKEN_LOOKUP")
            .unwrap_or_else(|_| DEFAULT_TOKEN_LOOKUP.to_string())
            .parse::<TokenLookup>()?
            .with_head_name(
                env::var("TOKEN_HEAD_NAME").unwrap_or_else(|_| DEFAULT_TOKEN_HEAD_NAME.to_string()),
            );

        Ok(Self {
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or(defaults.jwt_issuer.clone()),

            token_timeout: parse_var("JWT_TIMEOUT")?.unwrap_or(defaults.token_timeout),

            max_refresh: parse_var("JWT_MAX_REFRESH")?.unwrap_or(defaults.max_refresh),

            token_lookup,

            send_cookie: flag_var("SEND_COOKIE")?.unwrap_or(defaults.send_cookie),

            cookie_name: env::var("COOKIE_NAME").unwrap_or(defaults.cookie_name.clone()),

            secure_cookie: flag_var("SECURE_COOKIE")?.unwrap_or(defaults.secure_cookie),

            admin_identity: env::var("ADMIN_IDENTITY").ok().filter(|v| !v.is_empty()),

            argon2_memory_cost: parse_var("ARGON2_MEMORY_COST")?
                .unwrap_or(defaults.argon2_memory_cost),

            argon2_time_cost: parse_var("ARGON2_TIME_COST")?
                .unwrap_or(defaults.argon2_time_cost),

            argon2_parallelism: parse_var("ARGON2_PARALLELISM")?
                .unwrap_or(defaults.argon2_parallelism),

            ..defaults
        })
    }

    /// Argon2 parameters for the configured work factor
    pub fn argon2_params(&self) -> Result<Params, AuthError> {
        Params::new(
            self.argon2_memory_cost,
            self.argon2_time_cost,
            self.argon2_parallelism,
            None,
        )
        .map_err(|e| AuthError::Config(format!("invalid Argon2 work factor: {}", e)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.jwt_secret.len() < 32 {
            return Err(AuthError::Config(
                "JWT_SECRET must be at least 32 characters".to_string(),
            ));
        }

        if self.token_timeout <= 0 || self.token_timeout > MAX_TOKEN_WINDOW {
            return Err(AuthError::Config(format!(
                "JWT_TIMEOUT must be between 1 and {} seconds",
                MAX_TOKEN_WINDOW
            )));
        }

        if self.max_refresh < 0 || self.max_refresh > MAX_TOKEN_WINDOW {
            return Err(AuthError::Config(format!(
                "JWT_MAX_REFRESH must be between 0 and {} seconds",
                MAX_TOKEN_WINDOW
            )));
        }

        if self.token_lookup.head_name().is_empty() || self.token_lookup.head_name().contains(' ')
        {
            return Err(AuthError::Config(
                "TOKEN_HEAD_NAME must be a single non-empty word".to_string(),
            ));
        }

        if self.send_cookie && self.cookie_name.is_empty() {
            return Err(AuthError::Config(
                "COOKIE_NAME must be set when SEND_COOKIE is enabled".to_string(),
            ));
        }

        self.argon2_params()?;

        Ok(())
    }
}

/// `Ok(None)` when unset, an error when set to something unparseable
fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, AuthError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map(Some).map_err(|_| {
            AuthError::Config(format!("{} has an invalid value: {:?}", name, value))
        }),
        Err(_) => Ok(None),
    }
}

fn flag_var(name: &str) -> Result<Option<bool>, AuthError> {
    match env::var(name) {
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            _ => Err(AuthError::Config(format!(
                "{} must be true or false, got {:?}",
                name, value
            ))),
        },
        Err(_) => Ok(None),
    }
}
