//! Hash pipeline and the fan-out/fan-in barrier the interceptors drive it with.

use crate::crypto::SecretHasher;
use crate::errors::Result;
use std::sync::Arc;
use tokio::task::JoinSet;
use zeroize::Zeroizing;

/// Salts and hashes `value` with `rounds`. A salt failure skips the hash step.
pub async fn hash_value<H: SecretHasher>(hasher: &H, value: &str, rounds: u32) -> Result<String> {
    let salt = hasher.gen_salt(rounds).await?;
    hasher.hash(value, &salt).await
}

/// Join barrier over the hashes started for one operation.
///
/// Owned by a single interceptor invocation. Dropping it aborts whatever is still in flight.
pub struct HashFanOut<K> {
    tasks: JoinSet<(K, Result<String>)>,
    started: usize,
}

impl<K: Send + 'static> Default for HashFanOut<K> {
    fn default() -> Self {
        Self { tasks: JoinSet::new(), started: 0 }
    }
}

impl<K: Send + 'static> HashFanOut<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts hashing `value` without waiting for earlier hashes.
    pub fn spawn<H: SecretHasher>(&mut self, hasher: &Arc<H>, key: K, value: String, rounds: u32) {
        let hasher = Arc::clone(hasher);
        let value = Zeroizing::new(value);
        self.started += 1;
        self.tasks.spawn(async move {
            let res = hash_value(hasher.as_ref(), &value, rounds).await;
            (key, res)
        });
    }

    /// Hashes still outstanding.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub const fn started(&self) -> usize {
        self.started
    }

    /// Next completed hash in completion order, `None` once every hash has reported.
    pub async fn next(&mut self) -> Option<Result<(K, String)>> {
        match self.tasks.join_next().await? {
            Ok((key, Ok(hash))) => Some(Ok((key, hash))),
            Ok((_, Err(e))) => Some(Err(e)),
            Err(e) => Some(Err(e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Argon2Hasher, embedded_rounds};

    #[tokio::test]
    async fn barrier_reports_every_key_once() {
        let hasher = Arc::new(Argon2Hasher::with_memory_kib(64));
        let mut fan = HashFanOut::new();
        for (i, pw) in ["a", "b", "c"].into_iter().enumerate() {
            fan.spawn(&hasher, i, pw.to_string(), 2);
        }
        assert_eq!(fan.started(), 3);
        let mut seen = Vec::new();
        while let Some(done) = fan.next().await {
            let (key, hash) = done.unwrap();
            assert_eq!(embedded_rounds(&hash), Some(2));
            seen.push(key);
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(fan.outstanding(), 0);
    }

    #[tokio::test]
    async fn same_value_hashes_differently() {
        let hasher = Argon2Hasher::with_memory_kib(64);
        let a = hash_value(&hasher, "same", 2).await.unwrap();
        let b = hash_value(&hasher, "same", 2).await.unwrap();
        assert_ne!(a, b);
    }
}
