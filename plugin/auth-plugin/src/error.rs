//! Authentication Error Types
//!
//! Every failure in the authentication core is recovered into an [`AuthError`].
//! The HTTP boundary turns it into a status code and a `{code, message}` body.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Your password and confirmation password do not match")]
    PasswordMismatch,

    #[error("Your account has been registered")]
    AlreadyRegistered,

    /// Shared by unknown identities and wrong passwords.
    #[error("Incorrect email or password")]
    AuthenticationFailed,

    #[error("Authentication token is missing")]
    MissingToken,

    #[error("Token is malformed")]
    Malformed,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is expired")]
    Expired,

    #[error("Token is expired beyond the refresh window")]
    RefreshWindowExceeded,

    #[error("You don't have permission to access this resource")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error")]
    Internal,
}

impl AuthError {
    /// Stable machine-readable code used in error bodies
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::PasswordMismatch => "PASSWORD_MISMATCH",
            AuthError::AlreadyRegistered => "ALREADY_REGISTERED",
            AuthError::AuthenticationFailed => "AUTHENTICATION_FAILED",
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::Malformed => "MALFORMED_TOKEN",
            AuthError::InvalidSignature => "INVALID_SIGNATURE",
            AuthError::Expired => "TOKEN_EXPIRED",
            AuthError::RefreshWindowExceeded => "REFRESH_WINDOW_EXCEEDED",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::StoreUnavailable(_) | AuthError::Config(_) | AuthError::Internal => {
                "INTERNAL_ERROR"
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::PasswordMismatch | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::AlreadyRegistered => StatusCode::CONFLICT,
            AuthError::AuthenticationFailed
            | AuthError::MissingToken
            | AuthError::Malformed
            | AuthError::InvalidSignature
            | AuthError::Expired
            | AuthError::RefreshWindowExceeded => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::StoreUnavailable(_) | AuthError::Config(_) | AuthError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::StoreUnavailable(_) | AuthError::Config(_) | AuthError::Internal => {
                "An internal error occurred".to_string()
            }
            AuthError::Validation(msg) => msg.clone(),
            _ => self.to_string(),
        };

        (
            self.status(),
            Json(serde_json::json!({
                "code": self.code(),
                "message": message
            })),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Credential store error: {:?}", err);
        AuthError::StoreUnavailable(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        tracing::debug!("JWT error: {:?}", err);
        match err.kind() {
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::Malformed,
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AuthError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, body) = body_json(AuthError::AuthenticationFailed).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "AUTHENTICATION_FAILED");
        assert_eq!(body["message"], "Incorrect email or password");
    }

    #[tokio::test]
    async fn test_store_errors_do_not_leak_detail() {
        let (status, body) =
            body_json(AuthError::StoreUnavailable("connection refused on 10.0.0.3".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::PasswordMismatch.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::AlreadyRegistered.status(), StatusCode::CONFLICT);
        assert_eq!(AuthError::Expired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::RefreshWindowExceeded.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_jwt_error_mapping() {
        use jsonwebtoken::errors::{Error, ErrorKind};

        assert_eq!(
            AuthError::from(Error::from(ErrorKind::InvalidSignature)),
            AuthError::InvalidSignature
        );
        assert_eq!(
            AuthError::from(Error::from(ErrorKind::ExpiredSignature)),
            AuthError::Expired
        );
        assert_eq!(
            AuthError::from(Error::from(ErrorKind::InvalidToken)),
            AuthError::Malformed
        );
    }
}
