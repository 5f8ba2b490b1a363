//! Authentication Middleware
//!
//! Resolves the caller's account before a protected handler runs and stores
//! it in request extensions for the [`AuthUser`](crate::AuthUser) extractor.

use crate::error::AuthError;
use crate::handlers::AuthState;
use crate::models::Capability;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Token carried by `req`, per the configured lookup order
fn request_token(auth: &AuthState, req: &Request) -> Result<String, AuthError> {
    auth.config()
        .token_lookup
        .extract(req.headers(), req.uri())
}

/// Require authenticated user
pub async fn require_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = request_token(&auth, &req)?;
    let account = auth.resolve_identity(&token).await?;

    req.extensions_mut().insert(account);

    Ok(next.run(req).await)
}

/// Require the admin account
pub async fn require_admin(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = request_token(&auth, &req)?;
    let account = auth.resolve_identity(&token).await?;

    if !auth.authorize(&account, Capability::Admin) {
        tracing::warn!(account_id = %account.id, "Admin access denied");
        return Err(AuthError::Forbidden);
    }

    req.extensions_mut().insert(account);

    Ok(next.run(req).await)
}
