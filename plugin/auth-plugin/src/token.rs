//! Session Tokens
//!
//! HS256 JWTs carrying a typed [`Claims`] payload. Tokens are stateless:
//! validity is decided from the signature and the embedded timestamps only.
//!
//! Expiry is checked against the injected [`Clock`] rather than by
//! `jsonwebtoken`, so that `verify` and `refresh` can treat an expired token
//! differently.

use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::models::Claims;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;

/// Freshly signed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Token issuer and verifier
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    timeout: Duration,
    max_refresh: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.set_issuer(&[&config.jwt_issuer]);

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            issuer: config.jwt_issuer.clone(),
            timeout: seconds("JWT_TIMEOUT", config.token_timeout)?,
            max_refresh: seconds("JWT_MAX_REFRESH", config.max_refresh)?,
            clock,
        })
    }

    /// Token lifetime
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue a token asserting `subject`
    pub fn issue(&self, subject: &str) -> Result<IssuedToken, AuthError> {
        let now = self.clock.now();
        self.sign(subject, now, now.timestamp())
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.decode(token)?;

        if self.clock.now().timestamp() > claims.exp {
            tracing::debug!(sub = %claims.sub, exp = claims.exp, "Token expired");
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }

    /// Re-issue a token for the same subject
    ///
    /// Unlike [`verify`](Self::verify), an expired token is accepted as long as
    /// it expired no more than `max_refresh` ago.
    pub fn refresh(&self, token: &str) -> Result<IssuedToken, AuthError> {
        let claims = self.decode(token)?;
        let now = self.clock.now();

        if now.timestamp() > claims.exp.saturating_add(self.max_refresh.num_seconds()) {
            tracing::debug!(sub = %claims.sub, exp = claims.exp, "Refresh window exceeded");
            return Err(AuthError::RefreshWindowExceeded);
        }

        self.sign(&claims.sub, now, claims.orig_iat)
    }

    fn sign(
        &self,
        subject: &str,
        now: DateTime<Utc>,
        orig_iat: i64,
    ) -> Result<IssuedToken, AuthError> {
        let exp = now.checked_add_signed(self.timeout).ok_or_else(|| {
            tracing::error!(timeout = self.timeout.num_seconds(), "Token expiry out of range");
            AuthError::Internal
        })?;

        let claims = Claims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            orig_iat,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("Failed to sign token: {:?}", e);
                AuthError::Internal
            })?;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(AuthError::Internal)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check the signature and parse the claims. Never looks at `exp`.
    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;

        if claims.sub.is_empty() {
            return Err(AuthError::Malformed);
        }

        Ok(claims)
    }
}

fn seconds(name: &str, value: i64) -> Result<Duration, AuthError> {
    Duration::try_seconds(value)
        .ok_or_else(|| AuthError::Config(format!("{} is out of range", name)))
}
