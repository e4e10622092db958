//! Attaching field hashing to a schema, and the per-field encrypt/verify surface.
//!
//! ```ignore
//! let mut schema = Schema::new("users").with("name", FieldOptions::string());
//! let plugin = FieldHashPlugin::attach(&mut schema, &PluginOptions::new(), Argon2Hasher::default());
//! let users = Collection::new(schema);
//! let mut doc = Document::new(doc! { "name": "a", "password": "secret" });
//! users.save(&mut doc).await?;
//! assert!(plugin.verify(doc.data(), "password", "secret").await?);
//! ```

use crate::config::PluginOptions;
use crate::crypto::SecretHasher;
use crate::errors::{FieldHashError, Result};
use crate::interceptors::FieldHashHook;
use crate::path::get_path;
use crate::pipeline::hash_value;
use crate::registry::{FieldMethod, FieldRegistry, MethodKind};
use crate::schema::{HookPoint, PreHook, SchemaAdapter};
use bson::Document as BsonDocument;
use std::sync::Arc;

pub struct FieldHashPlugin<H> {
    registry: Arc<FieldRegistry>,
    hasher: Arc<H>,
}

impl<H> Clone for FieldHashPlugin<H> {
    fn clone(&self) -> Self {
        Self { registry: Arc::clone(&self.registry), hasher: Arc::clone(&self.hasher) }
    }
}

fn stored_hash<'a>(record: &'a BsonDocument, path: &str) -> Option<&'a str> {
    get_path(record, path).and_then(bson::Bson::as_str).filter(|s| !s.is_empty())
}

impl<H: SecretHasher> FieldHashPlugin<H> {
    /// Registers the protected fields on `schema`, declares the ones it lacks as strings and
    /// installs the hashing hook on every hook point.
    pub fn attach(schema: &mut impl SchemaAdapter, options: &PluginOptions, hasher: H) -> Self {
        let registry = Arc::new(FieldRegistry::build(&*schema, options));
        for path in registry.paths() {
            if !schema.has_path(path) {
                schema.declare_string_field(path);
            }
        }
        let hasher = Arc::new(hasher);
        let hook: Arc<dyn PreHook> =
            Arc::new(FieldHashHook::new(Arc::clone(&registry), Arc::clone(&hasher)));
        for point in HookPoint::all() {
            schema.register_hook(point, Arc::clone(&hook));
        }
        for f in registry.fields() {
            log::info!("protecting field {} (rounds {})", f.path(), f.rounds());
        }
        Self { registry, hasher }
    }

    #[must_use]
    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    #[must_use]
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Hashes `value` with the rounds of `path` without storing it.
    pub async fn encrypt(&self, path: &str, value: &str) -> Result<String> {
        let field = self.registry.require(path)?;
        hash_value(self.hasher.as_ref(), value, field.rounds()).await
    }

    /// [`Self::encrypt`], also handing the outcome to `cb`.
    pub async fn encrypt_with<F>(&self, path: &str, value: &str, cb: F) -> Result<String>
    where
        F: FnOnce(&Result<String>),
    {
        let res = self.encrypt(path, value).await;
        cb(&res);
        res
    }

    /// Compares `candidate` with the hash stored at `path`. A missing or empty hash never
    /// matches.
    pub async fn verify(&self, record: &BsonDocument, path: &str, candidate: &str) -> Result<bool> {
        self.registry.require(path)?;
        match stored_hash(record, path) {
            Some(hash) => self.hasher.compare(candidate, hash).await,
            None => Ok(false),
        }
    }

    /// [`Self::verify`], also handing the outcome to `cb`.
    pub async fn verify_with<F>(
        &self,
        record: &BsonDocument,
        path: &str,
        candidate: &str,
        cb: F,
    ) -> Result<bool>
    where
        F: FnOnce(&Result<bool>),
    {
        let res = self.verify(record, path, candidate).await;
        cb(&res);
        res
    }

    /// Blocking [`Self::verify`].
    pub fn verify_sync(&self, record: &BsonDocument, path: &str, candidate: &str) -> Result<bool> {
        self.registry.require(path)?;
        match stored_hash(record, path) {
            Some(hash) => self.hasher.compare_sync(candidate, hash),
            None => Ok(false),
        }
    }

    /// Hashes the value currently stored at `path` without writing it back.
    pub async fn get_encrypted(&self, record: &BsonDocument, path: &str) -> Result<String> {
        let field = self.registry.require(path)?;
        let value = get_path(record, path)
            .and_then(bson::Bson::as_str)
            .ok_or_else(|| FieldHashError::NotAString(path.to_string()))?;
        hash_value(self.hasher.as_ref(), value, field.rounds()).await
    }

    /// Resolves a generated operation name such as `encryptPassword` or `verifyNestedPwd1Sync`.
    pub fn method(&self, name: &str) -> Result<FieldMethod<'_>> {
        self.registry.method(name).ok_or_else(|| FieldHashError::InvalidField(name.to_string()))
    }

    fn method_of(&self, name: &str, kind: MethodKind) -> Result<FieldMethod<'_>> {
        match self.method(name)? {
            m if m.kind == kind => Ok(m),
            _ => Err(FieldHashError::InvalidField(name.to_string())),
        }
    }

    pub async fn call_encrypt(&self, name: &str, value: &str) -> Result<String> {
        let m = self.method_of(name, MethodKind::Encrypt)?;
        self.encrypt(m.field.path(), value).await
    }

    pub async fn call_verify(&self, name: &str, record: &BsonDocument, candidate: &str) -> Result<bool> {
        let m = self.method_of(name, MethodKind::Verify)?;
        self.verify(record, m.field.path(), candidate).await
    }

    pub fn call_verify_sync(&self, name: &str, record: &BsonDocument, candidate: &str) -> Result<bool> {
        let m = self.method_of(name, MethodKind::VerifySync)?;
        self.verify_sync(record, m.field.path(), candidate)
    }
}
