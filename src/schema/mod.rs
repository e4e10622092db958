//! Schema capability used by the plugin, plus an in-memory schema the bundled collection uses.

pub mod hooks;
pub mod types;

pub use hooks::{HookFuture, HookTarget, PreHook, TrackedRecord};
pub use types::{FieldKind, FieldOptions, HookPoint, UpdateKind};

use std::sync::Arc;

/// The narrow surface the plugin needs from a storage layer's schema.
pub trait SchemaAdapter {
    /// Declared leaf paths with their options, in declaration order.
    fn declared_paths(&self) -> Vec<(String, FieldOptions)>;
    fn has_path(&self, path: &str) -> bool;
    fn field_options(&self, path: &str) -> Option<FieldOptions>;
    /// Declares a string field at `path`, creating nested levels as needed.
    fn declare_string_field(&mut self, path: &str);
    fn register_hook(&mut self, point: HookPoint, hook: Arc<dyn PreHook>);
}

#[derive(Default, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<(String, FieldOptions)>,
    hooks: Vec<(HookPoint, Arc<dyn PreHook>)>,
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("hooks", &self.hooks.iter().map(|(p, h)| (*p, h.name().to_string())).collect::<Vec<_>>())
            .finish()
    }
}

impl Schema {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares `path`; ancestors of a dotted path are declared as objects.
    /// Re-declaring a path replaces its options.
    pub fn add(&mut self, path: &str, options: FieldOptions) -> &mut Self {
        let mut prefix = String::new();
        let mut segs = crate::path::segments(path).peekable();
        while let Some(seg) = segs.next() {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(seg);
            if segs.peek().is_none() {
                break;
            }
            if !self.fields.iter().any(|(p, _)| *p == prefix) {
                self.fields.push((prefix.clone(), FieldOptions::object()));
            }
        }
        match self.fields.iter_mut().find(|(p, _)| p == path) {
            Some((_, o)) => *o = options,
            None => self.fields.push((path.to_string(), options)),
        }
        self
    }

    /// Builder-style [`Schema::add`].
    #[must_use]
    pub fn with(mut self, path: &str, options: FieldOptions) -> Self {
        self.add(path, options);
        self
    }

    /// Hooks registered for `point`, in registration order.
    #[must_use]
    pub fn hooks(&self, point: HookPoint) -> Vec<Arc<dyn PreHook>> {
        self.hooks.iter().filter(|(p, _)| *p == point).map(|(_, h)| Arc::clone(h)).collect()
    }
}

impl SchemaAdapter for Schema {
    fn declared_paths(&self) -> Vec<(String, FieldOptions)> {
        self.fields.iter().filter(|(_, o)| o.kind != FieldKind::Object).cloned().collect()
    }

    fn has_path(&self, path: &str) -> bool {
        self.fields.iter().any(|(p, _)| p == path)
    }

    fn field_options(&self, path: &str) -> Option<FieldOptions> {
        self.fields.iter().find(|(p, _)| p == path).map(|(_, o)| o.clone())
    }

    fn declare_string_field(&mut self, path: &str) {
        self.add(path, FieldOptions::string());
    }

    fn register_hook(&mut self, point: HookPoint, hook: Arc<dyn PreHook>) {
        self.hooks.push((point, hook));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_declaration_materialises_parents() {
        let mut s = Schema::new("users");
        s.declare_string_field("a.b.c");
        assert!(s.has_path("a"));
        assert!(s.has_path("a.b"));
        assert!(s.has_path("a.b.c"));
        assert_eq!(s.field_options("a").map(|o| o.kind), Some(FieldKind::Object));
        let leaves: Vec<String> = s.declared_paths().into_iter().map(|(p, _)| p).collect();
        assert_eq!(leaves, vec!["a.b.c".to_string()]);
    }

    #[test]
    fn redeclaring_keeps_position_and_replaces_options() {
        let s = Schema::new("t")
            .with("name", FieldOptions::string())
            .with("pwd", FieldOptions::string())
            .with("name", FieldOptions::string().bcrypt());
        let paths = s.declared_paths();
        assert_eq!(paths[0].0, "name");
        assert!(paths[0].1.bcrypt);
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn hook_points_cover_every_update_kind() {
        assert_eq!(HookPoint::all().count(), 7);
        assert_eq!(HookPoint::Update(UpdateKind::FindOneAndUpdate).to_string(), "findOneAndUpdate");
    }
}
