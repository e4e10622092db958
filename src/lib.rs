//! Salted one-way hashing of protected document fields.
//!
//! [`FieldHashPlugin::attach`] registers the protected paths of a schema and installs a
//! pre-hook on save, bulk insert and every update entry point. Each hook hashes exactly the
//! protected fields the operation changes, writes the hashes back, and only then lets the
//! operation proceed. Verification helpers compare candidates against stored hashes.

pub mod changeset;
pub mod collection;
pub mod config;
pub mod crypto;
pub mod document;
pub mod errors;
pub mod interceptors;
pub mod logger;
pub mod path;
pub mod pipeline;
pub mod plugin;
pub mod query;
pub mod registry;
pub mod schema;
pub mod types;

pub use collection::Collection;
pub use config::{HasherConfig, PluginOptions};
pub use crypto::{Argon2Hasher, SecretHasher};
pub use document::Document;
pub use errors::{FieldHashError, Result};
pub use plugin::FieldHashPlugin;
pub use query::Filter;
pub use schema::{FieldOptions, Schema};

/// Initializes console logging.
///
/// Optional; the crate only emits through the `log` facade.
pub fn init() -> std::result::Result<(), Box<dyn std::error::Error>> {
    logger::init_default()
}
