//! Credential Store
//!
//! Persistence for [`Account`] records. Implementations must guarantee that at
//! most one insert per email succeeds, even under concurrent signups; a
//! duplicate insert reports [`AuthError::AlreadyRegistered`].

mod memory;
mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

use crate::error::AuthError;
use crate::models::{Account, NewAccount};

use async_trait::async_trait;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an account by email
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError>;

    /// Insert a new account
    async fn insert(&self, account: NewAccount) -> Result<Account, AuthError>;
}
