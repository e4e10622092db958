//! The salted one-way hash primitive the pipeline is built on.

use crate::errors::Result;
use std::future::Future;

/// A freshly generated salt together with the cost factor it was generated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt {
    pub rounds: u32,
    pub encoded: String,
}

/// Salt generation, hashing and constant-time comparison.
///
/// Every async step may suspend; implementations report failures as
/// [`crate::errors::FieldHashError::Salt`], `Hash` or `Compare` carrying the primitive's message.
pub trait SecretHasher: Send + Sync + 'static {
    /// Generates a new random salt for `rounds`. Two calls never share a salt.
    fn gen_salt(&self, rounds: u32) -> impl Future<Output = Result<Salt>> + Send;

    /// Hashes `value` with `salt`, producing a self-describing hash string.
    fn hash(&self, value: &str, salt: &Salt) -> impl Future<Output = Result<String>> + Send;

    /// Compares `candidate` against a stored hash in constant time.
    fn compare(&self, candidate: &str, hash: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Blocking variant of [`SecretHasher::compare`].
    fn compare_sync(&self, candidate: &str, hash: &str) -> Result<bool>;
}
