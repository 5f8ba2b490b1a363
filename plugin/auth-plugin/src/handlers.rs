//! Authentication HTTP Handlers
//!
//! REST endpoints for signup, login, token refresh and the protected routes.

use crate::error::AuthError;
use crate::extractors::AuthUser;
use crate::middleware;
use crate::models::*;
use crate::service::AuthService;
use crate::token::IssuedToken;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use validator::Validate;

/// Shared auth service state
pub type AuthState = Arc<AuthService>;

// ============================================
// Route Builder
// ============================================

/// Create authentication routes
///
/// Any path not matched here requires a valid token and then answers 404.
pub fn create_routes(auth_service: Arc<AuthService>) -> Router {
    // Public routes (no authentication required)
    let public = Router::new()
        .route("/users", post(signup))
        .route("/users/sign_in", post(login))
        // Accepts tokens past their expiry, within the refresh window
        .route("/auth/refresh_token", get(refresh_token));

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/auth/hello", get(hello))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_service.clone(),
            middleware::require_auth,
        ));

    let admin = Router::new()
        .route("/auth/admin", get(hello))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_service.clone(),
            middleware::require_admin,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(admin)
        .fallback(not_found)
        .with_state(auth_service)
}

// ============================================
// Signup
// ============================================

/// POST /users
///
/// Register a new account. Responds with an empty 200 on success.
pub async fn signup(
    State(auth): State<AuthState>,
    body: Result<Json<SignupPayload>, JsonRejection>,
) -> Result<StatusCode, AuthError> {
    let Json(payload) = body?;
    let req = payload.into_request();
    req.validate()?;

    auth.signup(&req.email, &req.password, &req.password_confirmation)
        .await?;

    Ok(StatusCode::OK)
}

// ============================================
// Login / Refresh
// ============================================

/// POST /users/sign_in
///
/// Authenticate and return a session token
pub async fn login(
    State(auth): State<AuthState>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AuthError> {
    let Json(req) = body?;
    req.validate()?;

    let issued = auth.login(&req.email, &req.password).await.map_err(|e| {
        if e == AuthError::AuthenticationFailed {
            tracing::info!(
                forwarded_for = ?headers.get("X-Forwarded-For"),
                user_agent = ?headers.get(header::USER_AGENT),
                "Rejected sign in"
            );
        }
        e
    })?;

    token_response(&auth, issued)
}

/// GET /auth/refresh_token
///
/// Exchange a valid or recently expired token for a fresh one
pub async fn refresh_token(
    State(auth): State<AuthState>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, AuthError> {
    let token = auth.config().token_lookup.extract(&headers, &uri)?;
    let issued = auth.refresh(&token)?;

    token_response(&auth, issued)
}

fn token_response(auth: &AuthService, issued: IssuedToken) -> Result<Response, AuthError> {
    let config = auth.config();

    let cookie = if config.send_cookie {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly",
            config.cookie_name,
            issued.token,
            auth.tokens().timeout().num_seconds()
        );
        if config.secure_cookie {
            cookie.push_str("; Secure");
        }
        Some(HeaderValue::from_str(&cookie).map_err(|_| AuthError::Internal)?)
    } else {
        None
    };

    let mut response = Json(TokenResponse {
        code: StatusCode::OK.as_u16(),
        token: issued.token,
        expire: issued.expires_at,
    })
    .into_response();

    if let Some(cookie) = cookie {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }

    Ok(response)
}

// ============================================
// Protected
// ============================================

/// GET /auth/hello
pub async fn hello(AuthUser(account): AuthUser) -> impl IntoResponse {
    Json(serde_json::json!({
        "userID": account.email,
        "email": account.email,
        "text": "Hello World."
    }))
}

/// Unmatched paths: authenticate first, then 404
pub async fn not_found(AuthUser(account): AuthUser) -> impl IntoResponse {
    tracing::debug!(account_id = %account.id, "No route");
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "code": "PAGE_NOT_FOUND",
            "message": "Page not found"
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::service::tests::{test_config, test_service};
    use crate::store::MemoryCredentialStore;

    use axum::body::Body;
    use axum::http::Request;
    use chrono::Duration;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, serde_json::Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with(uri: &str, header: Option<(&str, String)>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn signed_in(app: &Router, email: &str) -> String {
        let (status, _, _) = send(
            app,
            post_json(
                "/users",
                serde_json::json!({"email": email, "password": "p1", "password_confirmation": "p1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) = send(
            app,
            post_json("/users/sign_in", serde_json::json!({"email": email, "password": "p1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_worked_example_over_http() {
        let (auth, _) = test_service();
        let app = create_routes(auth);

        let signup = serde_json::json!({
            "email": "a@x.com", "password": "p1", "password_confirmation": "p1"
        });
        let (status, _, body) = send(&app, post_json("/users", signup.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());

        let (status, _, body) = send(&app, post_json("/users", signup)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ALREADY_REGISTERED");

        let (status, _, body) = send(
            &app,
            post_json("/users/sign_in", serde_json::json!({"email": "a@x.com", "password": "wrong"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "AUTHENTICATION_FAILED");

        let (status, _, body) = send(
            &app,
            post_json("/users/sign_in", serde_json::json!({"username": "a@x.com", "password": "p1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 200);
        assert!(body["expire"].is_string());
        let token = body["token"].as_str().unwrap().to_string();

        let (status, _, body) = send(
            &app,
            get_with("/auth/hello", Some(("Authorization", format!("Bearer {}", token)))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "a@x.com");
        assert_eq!(body["text"], "Hello World.");
    }

    #[tokio::test]
    async fn test_unreadable_bodies_get_error_json() {
        let (auth, _) = test_service();
        let app = create_routes(auth);

        // password_confirmation missing
        let (status, _, body) = send(
            &app,
            post_json("/users", serde_json::json!({"email": "a@x.com", "password": "p1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["message"].is_string());

        let not_json = Request::builder()
            .method("POST")
            .uri("/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let (status, _, body) = send(&app, not_json).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let no_content_type = Request::builder()
            .method("POST")
            .uri("/users/sign_in")
            .body(Body::from(r#"{"email":"a@x.com","password":"p1"}"#))
            .unwrap();
        let (status, _, body) = send(&app, no_content_type).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_signup_errors() {
        let (auth, _) = test_service();
        let app = create_routes(auth);

        let (status, _, body) = send(
            &app,
            post_json(
                "/users",
                serde_json::json!({"user": {"email": "a@x.com", "password": "p1", "password_confirmation": "p2"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "PASSWORD_MISMATCH");

        let (status, _, body) = send(
            &app,
            post_json(
                "/users",
                serde_json::json!({"email": "nope", "password": "p1", "password_confirmation": "p1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_token_accepted_from_query_and_cookie() {
        let (auth, _) = test_service();
        let app = create_routes(auth);
        let token = signed_in(&app, "a@x.com").await;

        let (status, _, body) = send(&app, get_with(&format!("/auth/hello?token={}", token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userID"], "a@x.com");

        let (status, _, _) = send(
            &app,
            get_with("/auth/hello", Some(("Cookie", format!("jwt={}", token)))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_route_rejections() {
        let (auth, clock) = test_service();
        let app = create_routes(auth);
        let token = signed_in(&app, "a@x.com").await;

        let (status, _, body) = send(&app, get_with("/auth/hello", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "MISSING_TOKEN");

        let (status, _, body) = send(
            &app,
            get_with("/auth/hello", Some(("Authorization", "Bearer garbage".to_string()))),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "MALFORMED_TOKEN");

        clock.advance(Duration::seconds(3601));
        let (status, _, body) = send(
            &app,
            get_with("/auth/hello", Some(("Authorization", format!("Bearer {}", token)))),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_refresh_endpoint() {
        let (auth, clock) = test_service();
        let app = create_routes(auth);
        let token = signed_in(&app, "a@x.com").await;

        clock.advance(Duration::seconds(3600 + 600));
        let (status, _, body) = send(
            &app,
            get_with("/auth/refresh_token", Some(("Authorization", format!("Bearer {}", token)))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let fresh = body["token"].as_str().unwrap().to_string();

        let (status, _, _) = send(
            &app,
            get_with("/auth/hello", Some(("Authorization", format!("Bearer {}", fresh)))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        clock.advance(Duration::seconds(3600));
        let (status, _, body) = send(
            &app,
            get_with("/auth/refresh_token", Some(("Authorization", format!("Bearer {}", token)))),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "REFRESH_WINDOW_EXCEEDED");
    }

    #[tokio::test]
    async fn test_unmatched_path_requires_auth_then_404() {
        let (auth, _) = test_service();
        let app = create_routes(auth);
        let token = signed_in(&app, "a@x.com").await;

        let (status, _, _) = send(&app, get_with("/nowhere", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, body) = send(
            &app,
            get_with("/nowhere", Some(("Authorization", format!("Bearer {}", token)))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "PAGE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_admin_route() {
        let (auth, _) = test_service();
        let app = create_routes(auth);
        let user_token = signed_in(&app, "a@x.com").await;
        let admin_token = signed_in(&app, "admin@x.com").await;

        let (status, _, body) = send(
            &app,
            get_with("/auth/admin", Some(("Authorization", format!("Bearer {}", user_token)))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let (status, _, body) = send(
            &app,
            get_with("/auth/admin", Some(("Authorization", format!("Bearer {}", admin_token)))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "admin@x.com");
    }

    #[tokio::test]
    async fn test_login_sets_cookie_when_enabled() {
        let mut config = test_config();
        config.send_cookie = true;
        config.secure_cookie = true;
        let auth = AuthService::with_clock(
            Arc::new(MemoryCredentialStore::new()),
            config,
            Arc::new(ManualClock::default()),
        )
        .unwrap();
        let app = create_routes(Arc::new(auth));

        send(
            &app,
            post_json(
                "/users",
                serde_json::json!({"email": "a@x.com", "password": "p1", "password_confirmation": "p1"}),
            ),
        )
        .await;
        let (status, headers, body) = send(
            &app,
            post_json("/users/sign_in", serde_json::json!({"email": "a@x.com", "password": "p1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        let token = body["token"].as_str().unwrap();
        assert!(cookie.starts_with(&format!("jwt={};", token)));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.ends_with("; Secure"));
    }
}
