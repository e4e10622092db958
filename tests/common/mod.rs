#![allow(dead_code)]

use fieldhash::crypto::{Argon2Hasher, Salt, SecretHasher};
use fieldhash::errors::{FieldHashError, Result};
use fieldhash::{Collection, FieldHashPlugin, PluginOptions, Schema};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Argon2 with a tiny memory cost so tests stay fast; rounds still vary per field.
pub fn cheap_hasher() -> Argon2Hasher {
    Argon2Hasher::with_memory_kib(64)
}

pub fn setup(mut schema: Schema, options: &PluginOptions) -> (FieldHashPlugin<Argon2Hasher>, Collection) {
    let plugin = FieldHashPlugin::attach(&mut schema, options, cheap_hasher());
    (plugin, Collection::new(schema))
}

/// Counts hash invocations.
#[derive(Clone)]
pub struct CountingHasher {
    inner: Argon2Hasher,
    pub hashes: Arc<AtomicUsize>,
}

impl CountingHasher {
    pub fn new() -> Self {
        Self { inner: cheap_hasher(), hashes: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn count(&self) -> usize {
        self.hashes.load(Ordering::SeqCst)
    }
}

impl SecretHasher for CountingHasher {
    async fn gen_salt(&self, rounds: u32) -> Result<Salt> {
        self.inner.gen_salt(rounds).await
    }

    async fn hash(&self, value: &str, salt: &Salt) -> Result<String> {
        self.hashes.fetch_add(1, Ordering::SeqCst);
        self.inner.hash(value, salt).await
    }

    async fn compare(&self, candidate: &str, hash: &str) -> Result<bool> {
        self.inner.compare(candidate, hash).await
    }

    fn compare_sync(&self, candidate: &str, hash: &str) -> Result<bool> {
        self.inner.compare_sync(candidate, hash)
    }
}

pub const FAIL_VALUE: &str = "boom";
pub const FAIL_ROUNDS: u32 = 13;

/// Fails to hash [`FAIL_VALUE`] and fails salt generation for [`FAIL_ROUNDS`].
#[derive(Clone)]
pub struct FailingHasher {
    inner: CountingHasher,
}

impl FailingHasher {
    pub fn new() -> Self {
        Self { inner: CountingHasher::new() }
    }

    pub fn hash_calls(&self) -> usize {
        self.inner.count()
    }
}

impl SecretHasher for FailingHasher {
    async fn gen_salt(&self, rounds: u32) -> Result<Salt> {
        if rounds == FAIL_ROUNDS {
            return Err(FieldHashError::Salt("entropy unavailable".into()));
        }
        self.inner.gen_salt(rounds).await
    }

    async fn hash(&self, value: &str, salt: &Salt) -> Result<String> {
        if value == FAIL_VALUE {
            self.inner.hashes.fetch_add(1, Ordering::SeqCst);
            return Err(FieldHashError::Hash("boom rejected".into()));
        }
        self.inner.hash(value, salt).await
    }

    async fn compare(&self, candidate: &str, hash: &str) -> Result<bool> {
        self.inner.compare(candidate, hash).await
    }

    fn compare_sync(&self, candidate: &str, hash: &str) -> Result<bool> {
        self.inner.compare_sync(candidate, hash)
    }
}
