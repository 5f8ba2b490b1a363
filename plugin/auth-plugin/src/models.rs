//! Authentication Models
//!
//! Data structures for authentication requests, responses, and stored accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

// ============================================
// Stored Entities
// ============================================

/// Account record owned by the credential store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account about to be inserted
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Capabilities checked by [`crate::AuthService::authorize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Caller is the configured admin account
    Admin,
}

// ============================================
// Request DTOs
// ============================================

/// Signup request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    pub password_confirmation: String,
}

/// Signup body, either flat or wrapped in a `user` object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignupPayload {
    Wrapped { user: SignupRequest },
    Flat(SignupRequest),
}

impl SignupPayload {
    pub fn into_request(self) -> SignupRequest {
        match self {
            SignupPayload::Wrapped { user } => user,
            SignupPayload::Flat(req) => req,
        }
    }
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

// ============================================
// Response DTOs
// ============================================

/// Public account data
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            created_at: account.created_at,
        }
    }
}

/// Token handed out by login and refresh
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub code: u16,
    pub token: String,
    pub expire: DateTime<Utc>,
}

// ============================================
// JWT Claims
// ============================================

/// Session token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Claims {
    /// Subject (account email)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// When the session was first issued; kept across refreshes
    pub orig_iat: i64,
}
