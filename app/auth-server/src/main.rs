//! QiyeTalk Account Server
//!
//! Serves the authentication routes:
//! - `POST /users` sign up
//! - `POST /users/sign_in` sign in, returns a token
//! - `GET /auth/refresh_token` refresh a token
//! - `GET /auth/hello` token-protected greeting
//! - `GET /ping` liveness

use anyhow::Result;
use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use qiyetalk_auth::{AuthConfig, AuthService, PgCredentialStore};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

// ============================================
// Router Setup
// ============================================

/// Browser clients on any origin, with credentials. The token header is
/// exposed so clients can read it.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(12 * 60 * 60))
}

pub fn create_router(auth: Arc<AuthService>) -> Router {
    Router::new()
        .route("/ping", get(|| async { "pong" }))
        .merge(qiyetalk_auth::create_routes(auth))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("qiyetalk_server=info".parse()?)
                .add_directive("qiyetalk_auth=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let config = AuthConfig::from_env()?;
    info!(
        token_lookup = %config.token_lookup,
        timeout = config.token_timeout,
        max_refresh = config.max_refresh,
        "Authentication configured"
    );

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable must be set"))?;
    let pool = PgPool::connect(&database_url).await?;

    let store = PgCredentialStore::new(pool);
    store.migrate().await?;

    let auth = Arc::new(AuthService::new(Arc::new(store), config)?);
    let app = create_router(auth);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(80);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting QiyeTalk server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
