//! Registry of protected fields, built once when the plugin is attached.

use crate::config::{DEFAULT_ROUNDS, PluginOptions};
use crate::errors::{FieldHashError, Result};
use crate::path::camel_case;
use crate::schema::SchemaAdapter;
use std::collections::HashMap;

/// A protected field path and its cost factor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    path: String,
    override_rounds: Option<u32>,
    rounds: u32,
}

impl FieldSpec {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        crate::path::segments(&self.path)
    }

    /// Field-level override, if the declaration carried one.
    #[must_use]
    pub const fn override_rounds(&self) -> Option<u32> {
        self.override_rounds
    }

    /// Effective cost factor: field override, else plugin default, else [`DEFAULT_ROUNDS`].
    #[must_use]
    pub const fn rounds(&self) -> u32 {
        self.rounds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Encrypt,
    Verify,
    VerifySync,
}

/// Generated operation names of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMethods {
    pub encrypt: String,
    pub verify: String,
    pub verify_sync: String,
}

impl FieldMethods {
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        let name = camel_case(path);
        Self {
            encrypt: format!("encrypt{name}"),
            verify: format!("verify{name}"),
            verify_sync: format!("verify{name}Sync"),
        }
    }
}

/// A named operation resolved to its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMethod<'a> {
    pub field: &'a FieldSpec,
    pub kind: MethodKind,
}

#[must_use]
pub fn resolve_rounds(field: Option<u32>, plugin: Option<u32>) -> u32 {
    field.filter(|r| *r > 0).or(plugin.filter(|r| *r > 0)).unwrap_or(DEFAULT_ROUNDS)
}

/// Paths whose declaration carries the `bcrypt` marker, in declaration order.
pub fn discover(schema: &impl SchemaAdapter) -> Vec<String> {
    schema.declared_paths().into_iter().filter(|(_, o)| o.bcrypt).map(|(p, _)| p).collect()
}

/// Merges explicit and discovered paths: first-seen order, no duplicates, explicit first.
/// Falls back to `default_path` when nothing remains.
#[must_use]
pub fn merge_paths(explicit: Vec<String>, discovered: Vec<String>, default_path: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(explicit.len() + discovered.len());
    for p in explicit.into_iter().chain(discovered) {
        if !out.contains(&p) {
            out.push(p);
        }
    }
    if out.is_empty() {
        out.push(default_path.to_string());
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: Vec<FieldSpec>,
    methods: Vec<FieldMethods>,
    by_name: HashMap<String, (usize, MethodKind)>,
}

impl FieldRegistry {
    /// Builds the registry from a schema and the plugin options.
    ///
    /// Rounds overrides are read from the schema declaration of each path, so they must be
    /// declared before this runs. Declaring the missing string fields is left to the caller.
    pub fn build(schema: &impl SchemaAdapter, options: &PluginOptions) -> Self {
        let paths = merge_paths(
            options.fields.clone(),
            discover(schema),
            crate::config::DEFAULT_FIELD,
        );
        let plugin_rounds = options.plugin_rounds();
        let specs = paths.into_iter().map(|path| {
            let override_rounds = schema.field_options(&path).and_then(|o| o.rounds);
            let rounds = resolve_rounds(override_rounds, plugin_rounds);
            FieldSpec { path, override_rounds, rounds }
        });
        Self::from_specs(specs)
    }

    fn from_specs(specs: impl IntoIterator<Item = FieldSpec>) -> Self {
        let mut reg = Self::default();
        for spec in specs {
            let idx = reg.fields.len();
            let methods = FieldMethods::for_path(&spec.path);
            reg.by_name.insert(methods.encrypt.clone(), (idx, MethodKind::Encrypt));
            reg.by_name.insert(methods.verify.clone(), (idx, MethodKind::Verify));
            reg.by_name.insert(methods.verify_sync.clone(), (idx, MethodKind::VerifySync));
            reg.fields.push(spec);
            reg.methods.push(methods);
        }
        reg
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldSpec::path)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.path == path)
    }

    /// Like [`FieldRegistry::get`], failing with `InvalidField` for unregistered paths.
    pub fn require(&self, path: &str) -> Result<&FieldSpec> {
        self.get(path).ok_or_else(|| FieldHashError::InvalidField(path.to_string()))
    }

    #[must_use]
    pub fn methods_of(&self, path: &str) -> Option<&FieldMethods> {
        let idx = self.fields.iter().position(|f| f.path == path)?;
        self.methods.get(idx)
    }

    /// Resolves a generated operation name such as `verifyNestedPwd1Sync`.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<FieldMethod<'_>> {
        let (idx, kind) = *self.by_name.get(name)?;
        Some(FieldMethod { field: &self.fields[idx], kind })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
