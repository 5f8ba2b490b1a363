//! QiyeTalk Authentication
//!
//! Account authentication core providing:
//! - Account signup with password confirmation
//! - Login with Argon2id password verification
//! - Stateless HS256 session tokens
//! - Token refresh within a grace window after expiry
//! - Token lookup from header, query parameter or cookie
//! - A single configured admin identity
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables by [`AuthConfig::from_env`]:
//! - `JWT_SECRET` - Secret key for signing JWTs (required, min 32 chars)
//! - `JWT_TIMEOUT` - Token lifetime in seconds (default: 3600)
//! - `JWT_MAX_REFRESH` - Refresh grace window after expiry in seconds (default: 3600)
//! - `JWT_ISSUER` - JWT issuer claim (default: "qiyetalk")
//! - `TOKEN_LOOKUP` - Token sources in order (default: "header: Authorization, query: token, cookie: jwt")
//! - `ADMIN_IDENTITY` - Email of the admin account (default: none)
//! - `ARGON2_MEMORY_COST`, `ARGON2_TIME_COST`, `ARGON2_PARALLELISM` - Password hashing work factor
//!
//! # Usage
//!
//! ```rust,ignore
//! use qiyetalk_auth::{AuthConfig, AuthService, PgCredentialStore};
//!
//! let store = PgCredentialStore::new(db_pool);
//! store.migrate().await?;
//!
//! let auth = Arc::new(AuthService::new(Arc::new(store), AuthConfig::from_env()?)?);
//! let app = qiyetalk_auth::create_routes(auth);
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod lookup;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod store;
pub mod token;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AuthConfig;
pub use error::AuthError;
pub use extractors::AuthUser;
pub use handlers::{create_routes, AuthState};
pub use lookup::{TokenLookup, TokenSource};
pub use models::*;
pub use password::PasswordHasher;
pub use service::AuthService;
pub use store::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
pub use token::{IssuedToken, TokenIssuer};
