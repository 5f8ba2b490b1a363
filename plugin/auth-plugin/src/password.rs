//! Password Hashing
//!
//! Argon2id with a random salt per call. The work factor comes from
//! [`AuthConfig`]; verification reads the parameters embedded in the stored
//! hash, so hashes made under an older work factor keep verifying.

use crate::config::AuthConfig;
use crate::error::AuthError;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Version,
};
use rand::Rng;

/// Salted one-way password hasher
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// Hash of a random password, verified against when the account is unknown
    dummy_hash: String,
}

impl PasswordHasher {
    /// Build a hasher for the configured work factor
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let params = config.argon2_params()?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let dummy_password: [u8; 32] = rand::thread_rng().gen();
        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2.hash_password(&dummy_password, &salt)?.to_string();

        Ok(Self { argon2, dummy_hash })
    }

    /// Hash a password
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)?
            .to_string();

        Ok(hash)
    }

    /// Verify a password against a stored hash
    ///
    /// Returns false for a wrong password and for a hash that cannot be parsed.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Spend the same effort as a real verification, always failing
    pub fn verify_dummy(&self, password: &str) -> bool {
        self.verify(password, &self.dummy_hash);
        false
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        tracing::error!("Password hashing error: {:?}", err);
        AuthError::Internal
    }
}
