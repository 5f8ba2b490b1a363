//! Authentication Extractors
//!
//! Axum extractor for the authenticated caller.

use crate::error::AuthError;
use crate::handlers::AuthState;
use crate::models::Account;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

/// Account of the authenticated caller
///
/// Taken from request extensions when [`crate::middleware::require_auth`] already
/// ran, otherwise resolved from the request's token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Account);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(account) = parts.extensions.get::<Account>() {
            return Ok(AuthUser(account.clone()));
        }

        let auth = AuthState::from_ref(state);
        let token = auth
            .config()
            .token_lookup
            .extract(&parts.headers, &parts.uri)?;

        let account = auth.resolve_identity(&token).await?;
        Ok(AuthUser(account))
    }
}
