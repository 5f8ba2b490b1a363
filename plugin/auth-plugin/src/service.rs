//! Authentication Service
//!
//! Core authentication logic: signup, login, per-request identity
//! resolution, token refresh and the admin capability check. Composes the
//! credential store, the password hasher and the token issuer.

use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::models::*;
use crate::password::PasswordHasher;
use crate::store::CredentialStore;
use crate::token::{IssuedToken, TokenIssuer};

use std::sync::Arc;

/// Authentication service
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    config: AuthConfig,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(store: Arc<dyn CredentialStore>, config: AuthConfig) -> Result<Self, AuthError> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create a service reading time from `clock`
    pub fn with_clock(
        store: Arc<dyn CredentialStore>,
        config: AuthConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        config.validate()?;

        let hasher = PasswordHasher::new(&config)?;
        let tokens = TokenIssuer::new(&config, clock.clone())?;

        Ok(Self {
            store,
            config,
            hasher,
            tokens,
            clock,
        })
    }

    /// Get reference to config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Get reference to the token issuer
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    // ============================================
    // Signup
    // ============================================

    /// Register a new account
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<Account, AuthError> {
        if password != password_confirmation {
            return Err(AuthError::PasswordMismatch);
        }

        if self.store.find_by_email(email).await?.is_some() {
            return Err(AuthError::AlreadyRegistered);
        }

        let password_hash = self.hasher.hash(password)?;

        let now = self.clock.now();
        let account = self
            .store
            .insert(NewAccount {
                email: email.to_string(),
                password_hash,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(account_id = %account.id, "Account registered");
        Ok(account)
    }

    // ============================================
    // Login
    // ============================================

    /// Check credentials and issue a session token
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let account = self.store.find_by_email(email).await?;

        let verified = match &account {
            Some(account) => self.hasher.verify(password, &account.password_hash),
            None => self.hasher.verify_dummy(password),
        };

        let account = match account {
            Some(account) if verified => account,
            _ => {
                tracing::warn!("Failed login attempt");
                return Err(AuthError::AuthenticationFailed);
            }
        };

        let issued = self.tokens.issue(&account.email)?;

        tracing::info!(account_id = %account.id, "Login succeeded");
        Ok(issued)
    }

    // ============================================
    // Per-request Identity
    // ============================================

    /// Resolve the account a token speaks for
    pub async fn resolve_identity(&self, token: &str) -> Result<Account, AuthError> {
        let claims = self.tokens.verify(token)?;

        self.store
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Valid token for an unknown account");
                AuthError::AuthenticationFailed
            })
    }

    /// Re-issue a token that is valid or recently expired
    pub fn refresh(&self, token: &str) -> Result<IssuedToken, AuthError> {
        self.tokens.refresh(token)
    }

    /// Capability check
    ///
    /// Only `Admin` exists: exact match against the configured admin identity.
    /// Without one, nobody is admin.
    pub fn authorize(&self, account: &Account, capability: Capability) -> bool {
        match capability {
            Capability::Admin => {
                self.config.admin_identity.as_deref() == Some(account.email.as_str())
            }
        }
    }
}
