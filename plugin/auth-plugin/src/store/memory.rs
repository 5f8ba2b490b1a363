use super::CredentialStore;
use crate::error::AuthError;
use crate::models::{Account, NewAccount};

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process credential store keyed by email
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        Ok(self.accounts.read().await.get(email).cloned())
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, AuthError> {
        if account.password_hash.is_empty() {
            return Err(AuthError::Internal);
        }

        // Check and insert under one write lock
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.email) {
            return Err(AuthError::AlreadyRegistered);
        }

        let stored = Account {
            id: Uuid::new_v4(),
            email: account.email,
            password_hash: account.password_hash,
            created_at: account.created_at,
            updated_at: account.updated_at,
        };
        accounts.insert(stored.email.clone(), stored.clone());

        Ok(stored)
    }
}
