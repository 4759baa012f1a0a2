use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};
use tokio::task::JoinError;

use crate::utils::config::HashingConfig;

#[derive(Debug, thiserror::Error)]
pub enum HashingError {
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("hashing task did not complete: {0}")]
    Task(#[from] JoinError),
}

/// Salted one-way password hashing (Argon2id, PHC string output).
#[derive(Clone)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
}

impl SecretHasher {
    pub fn new(config: &HashingConfig) -> anyhow::Result<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| anyhow::anyhow!("Invalid argon2 parameters: {e}"))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash `plaintext` with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashingError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| HashingError::Hash(e.to_string()))?;
        Ok(password_hash.to_string())
    }

    /// Verify `plaintext` against a stored hash using the salt and parameters
    /// embedded in it. A malformed hash never verifies.
    pub fn verify(&self, plaintext: &str, stored_hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(stored_hash) else {
            tracing::debug!("Stored password hash is malformed");
            return false;
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// [`Self::hash`] on the blocking pool.
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, HashingError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext)).await?
    }

    /// [`Self::verify`] on the blocking pool.
    pub async fn verify_blocking(
        &self,
        plaintext: String,
        stored_hash: String,
    ) -> Result<bool, HashingError> {
        let hasher = self.clone();
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &stored_hash)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_hasher() -> SecretHasher {
        SecretHasher::new(&HashingConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn hash_and_verify_password() {
        let hasher = cheap_hasher();
        let hash = hasher.hash("abc12345").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("abc12345", &hash));
        assert!(!hasher.verify("abc12346", &hash));
    }

    #[test]
    fn hash_generates_different_salts() {
        let hasher = cheap_hasher();
        let hash1 = hasher.hash("same_password").unwrap();
        let hash2 = hasher.hash("same_password").unwrap();

        assert_ne!(hash1, hash2);
        assert!(hasher.verify("same_password", &hash1));
        assert!(hasher.verify("same_password", &hash2));
    }

    #[test]
    fn verify_uses_parameters_embedded_in_hash() {
        let stronger = SecretHasher::new(&HashingConfig {
            memory_kib: 16,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        let hash = stronger.hash("secret1").unwrap();

        assert!(cheap_hasher().verify("secret1", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let hasher = cheap_hasher();
        assert!(!hasher.verify("password", "not_a_valid_hash"));
        assert!(!hasher.verify("", ""));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let result = SecretHasher::new(&HashingConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn blocking_variants_match_sync_results() {
        let hasher = cheap_hasher();
        let hash = hasher.hash_blocking("abc12345".into()).await.unwrap();
        assert!(hasher
            .verify_blocking("abc12345".into(), hash.clone())
            .await
            .unwrap());
        assert!(!hasher.verify_blocking("nope".into(), hash).await.unwrap());
    }
}
