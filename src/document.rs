//! Records with dirty tracking.
//!
//! Modifications are tracked per leaf path: writing a sub-document only marks the leaves whose
//! value differs from what was stored before. A path counts as modified when it or one of its
//! descendants changed since the record was created, loaded or last saved.

use crate::path::{get_path, set_path, unset_path};
use crate::schema::TrackedRecord;
use crate::types::DocumentId;
use bson::{Bson, Document as BsonDocument};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self { created_at: now, updated_at: now }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    data: BsonDocument,
    pub metadata: Metadata,
    #[serde(skip)]
    modified: BTreeSet<String>,
    #[serde(skip)]
    is_new: bool,
}

fn is_under(child: &str, parent: &str) -> bool {
    child.len() > parent.len()
        && child.starts_with(parent)
        && child.as_bytes()[parent.len()] == b'.'
}

/// Records in `out` every leaf of `new` (rooted at `prefix`) whose value differs from `old`.
/// An empty sub-document counts as a leaf.
fn changed_leaves(prefix: &str, old: Option<&Bson>, new: &Bson, out: &mut BTreeSet<String>) {
    match new {
        Bson::Document(fields) if !fields.is_empty() => {
            let prev = match old {
                Some(Bson::Document(o)) => Some(o),
                _ => None,
            };
            for (k, v) in fields {
                changed_leaves(&format!("{prefix}.{k}"), prev.and_then(|o| o.get(k)), v, out);
            }
        }
        _ if old == Some(new) => {}
        _ => {
            out.insert(prefix.to_string());
        }
    }
}

impl Document {
    /// A new, unsaved record; every leaf present in `data` counts as modified.
    #[must_use]
    pub fn new(data: BsonDocument) -> Self {
        let mut modified = BTreeSet::new();
        for (k, v) in &data {
            changed_leaves(k, None, v, &mut modified);
        }
        Self { id: DocumentId::new(), data, metadata: Metadata::new(), modified, is_new: true }
    }

    /// A record as loaded from storage, with nothing modified.
    #[must_use]
    pub const fn from_stored(id: DocumentId, data: BsonDocument, metadata: Metadata) -> Self {
        Self { id, data, metadata, modified: BTreeSet::new(), is_new: false }
    }

    #[must_use]
    pub const fn data(&self) -> &BsonDocument {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> BsonDocument {
        self.data
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Bson> {
        get_path(&self.data, path)
    }

    #[must_use]
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Bson::as_str)
    }

    /// Writes `value` at `path` and marks the leaves whose value changed.
    pub fn set(&mut self, path: &str, value: impl Into<Bson>) -> &mut Self {
        let value = value.into();
        let old = set_path(&mut self.data, path, value.clone());
        changed_leaves(path, old.as_ref(), &value, &mut self.modified);
        self
    }

    /// Removes the value at `path`; the path is marked modified when something was removed.
    pub fn unset(&mut self, path: &str) -> Option<Bson> {
        let old = unset_path(&mut self.data, path);
        if old.is_some() {
            self.mark_modified(path);
        }
        old
    }

    pub fn mark_modified(&mut self, path: &str) {
        self.modified.insert(path.to_string());
    }

    #[must_use]
    pub fn is_modified(&self, path: &str) -> bool {
        self.modified.iter().any(|m| m == path || is_under(m, path))
    }

    pub fn modified_paths(&self) -> impl Iterator<Item = &str> {
        self.modified.iter().map(String::as_str)
    }

    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.is_new
    }

    /// Clears dirty state after the record was persisted.
    pub fn mark_clean(&mut self) {
        self.modified.clear();
        self.is_new = false;
        self.metadata.updated_at = Utc::now();
    }
}

impl TrackedRecord for Document {
    fn is_modified(&self, path: &str) -> bool {
        Self::is_modified(self, path)
    }

    fn data(&self) -> &BsonDocument {
        &self.data
    }

    fn data_mut(&mut self) -> &mut BsonDocument {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn new_document_marks_present_leaves() {
        let d = Document::new(doc! { "name": "a", "nested": { "pwd1": "x" }, "empty": {} });
        assert!(d.is_new());
        assert!(d.is_modified("name"));
        assert!(d.is_modified("nested"));
        assert!(d.is_modified("nested.pwd1"));
        assert!(d.is_modified("empty"));
        assert!(!d.is_modified("nested.pwd2"));
        assert!(!d.is_modified("password"));
    }

    #[test]
    fn set_marks_the_path_and_its_ancestors() {
        let mut d = Document::from_stored(DocumentId::new(), doc! {}, Metadata::new());
        d.set("a.b", "v");
        assert!(d.is_modified("a"));
        assert!(d.is_modified("a.b"));
        assert!(!d.is_modified("a.b.c"));
        assert!(!d.is_modified("a.bc"));
        assert!(!d.is_modified("ab"));
        assert_eq!(d.get_str("a.b"), Some("v"));
    }

    #[test]
    fn setting_a_parent_marks_only_changed_leaves() {
        let stored = doc! { "nested": { "pwd1": "h", "other": "x" } };
        let mut d = Document::from_stored(DocumentId::new(), stored, Metadata::new());
        d.set("nested", doc! { "pwd1": "h", "other": "y", "extra": 1 });
        assert!(!d.is_modified("nested.pwd1"));
        assert!(d.is_modified("nested.other"));
        assert!(d.is_modified("nested.extra"));
        assert!(d.is_modified("nested"));
    }

    #[test]
    fn rewriting_the_same_value_is_not_a_change() {
        let stored = doc! { "password": "h" };
        let mut d = Document::from_stored(DocumentId::new(), stored, Metadata::new());
        d.set("password", "h");
        assert!(!d.is_modified("password"));
        d.set("password", Bson::Null);
        assert!(d.is_modified("password"));
    }

    #[test]
    fn mark_clean_resets_state() {
        let mut d = Document::new(doc! { "password": "x" });
        d.mark_clean();
        assert!(!d.is_new());
        assert_eq!(d.modified_paths().count(), 0);
        assert!(d.unset("missing").is_none());
        assert_eq!(d.modified_paths().count(), 0);
    }
}
