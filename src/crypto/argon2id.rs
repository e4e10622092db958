//! Argon2id implementation of [`SecretHasher`].
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`); the cost factor
//! ("rounds") is the Argon2 time cost `t`, so every hash carries the rounds it was built with.

use super::hasher::{Salt, SecretHasher};
use crate::config::HasherConfig;
use crate::errors::{FieldHashError, Result};
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroizing;

const SALT_LEN: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    config: HasherConfig,
}

impl Argon2Hasher {
    #[must_use]
    pub const fn new(config: HasherConfig) -> Self {
        Self { config }
    }

    /// Hasher configured from the environment (see [`HasherConfig::from_env`]).
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(HasherConfig::from_env())
    }

    /// Hasher with the given memory cost and the default lane count.
    #[must_use]
    pub fn with_memory_kib(memory_kib: u32) -> Self {
        Self::new(HasherConfig { memory_kib, ..HasherConfig::default() })
    }

    #[must_use]
    pub const fn config(&self) -> &HasherConfig {
        &self.config
    }

    fn params(&self, rounds: u32) -> Result<Params> {
        Params::new(self.config.memory_kib, rounds, self.config.lanes, None)
            .map_err(|e| FieldHashError::Hash(format!("argon2 params: {e}")))
    }
}

fn verify(candidate: &[u8], hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| FieldHashError::Compare(e.to_string()))?;
    match Argon2::default().verify_password(candidate, &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(FieldHashError::Compare(e.to_string())),
    }
}

impl SecretHasher for Argon2Hasher {
    async fn gen_salt(&self, rounds: u32) -> Result<Salt> {
        let mut bytes = [0u8; SALT_LEN];
        getrandom::fill(&mut bytes).map_err(|e| FieldHashError::Salt(e.to_string()))?;
        let salt = SaltString::encode_b64(&bytes).map_err(|e| FieldHashError::Salt(e.to_string()))?;
        Ok(Salt { rounds, encoded: salt.as_str().to_string() })
    }

    async fn hash(&self, value: &str, salt: &Salt) -> Result<String> {
        let params = self.params(salt.rounds)?;
        let value = Zeroizing::new(value.to_owned());
        let encoded = salt.encoded.clone();
        tokio::task::spawn_blocking(move || {
            let salt =
                SaltString::from_b64(&encoded).map_err(|e| FieldHashError::Hash(e.to_string()))?;
            Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
                .hash_password(value.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(|e| FieldHashError::Hash(e.to_string()))
        })
        .await?
    }

    async fn compare(&self, candidate: &str, hash: &str) -> Result<bool> {
        let candidate = Zeroizing::new(candidate.to_owned());
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || verify(candidate.as_bytes(), &hash)).await?
    }

    fn compare_sync(&self, candidate: &str, hash: &str) -> Result<bool> {
        verify(candidate.as_bytes(), hash)
    }
}

/// Reads the cost factor embedded in a hash produced by [`Argon2Hasher`].
#[must_use]
pub fn embedded_rounds(hash: &str) -> Option<u32> {
    PasswordHash::new(hash).ok()?.params.get_decimal("t")
}
