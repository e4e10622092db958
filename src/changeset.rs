//! Works out which protected fields a persistence operation touches.
//!
//! Three sources are supported: a dirty-tracked record (save), plain documents (bulk insert)
//! and a raw update expression (update queries and replacements).

use crate::path::{get_path, set_path};
use crate::registry::{FieldRegistry, FieldSpec};
use crate::schema::TrackedRecord;
use bson::{Bson, Document};

const SET: &str = "$set";

/// Where a value was found inside an update expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Found under `$set` rather than at the top level.
    pub in_set: bool,
    /// Stored under a literal dotted key (`"a.b": ..`) instead of nested objects.
    pub literal: bool,
}

impl Slot {
    /// Plain nested location relative to the target root.
    pub const ROOT: Self = Self { in_set: false, literal: false };
}

/// One protected field present in the operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEntry<'r> {
    pub field: &'r FieldSpec,
    pub value: Bson,
    /// Locations to write the result to; each receives the same hash.
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet<'r> {
    entries: Vec<ChangeEntry<'r>>,
}

impl<'r> ChangeSet<'r> {
    #[must_use]
    pub fn entries(&self) -> &[ChangeEntry<'r>] {
        &self.entries
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<ChangeEntry<'r>> {
        self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.field.path())
    }

    /// Fields the record reports as modified. A modified field that no longer holds a value is
    /// reported with `Bson::Null`.
    pub fn for_record(record: &dyn TrackedRecord, registry: &'r FieldRegistry) -> Self {
        let entries = registry
            .fields()
            .iter()
            .filter(|f| record.is_modified(f.path()))
            .map(|field| ChangeEntry {
                field,
                value: get_path(record.data(), field.path()).cloned().unwrap_or(Bson::Null),
                slots: vec![Slot::ROOT],
            })
            .collect();
        Self { entries }
    }

    /// Fields present at their exact path in a plain document about to be inserted.
    pub fn for_insert(doc: &Document, registry: &'r FieldRegistry) -> Self {
        let entries = registry
            .fields()
            .iter()
            .filter_map(|field| {
                get_path(doc, field.path()).map(|v| ChangeEntry {
                    field,
                    value: v.clone(),
                    slots: vec![Slot::ROOT],
                })
            })
            .collect();
        Self { entries }
    }

    /// Fields an update expression sets, at the top level or under `$set`.
    ///
    /// A field set in both places is reported once with the `$set` value and both slots, so it
    /// is hashed a single time and the same hash lands in each location.
    pub fn for_update(update: &Document, registry: &'r FieldRegistry) -> Self {
        let set = match update.get(SET) {
            Some(Bson::Document(d)) => Some(d),
            _ => None,
        };
        let mut entries = Vec::new();
        for field in registry.fields() {
            let top = lookup(update, field.path(), false);
            let nested = set.and_then(|s| lookup(s, field.path(), true));
            let (value, slots) = match (top, nested) {
                (None, None) => continue,
                (Some((v, s)), None) | (None, Some((v, s))) => (v, vec![s]),
                (Some((_, top_slot)), Some((v, set_slot))) => (v, vec![top_slot, set_slot]),
            };
            entries.push(ChangeEntry { field, value: value.clone(), slots });
        }
        Self { entries }
    }
}

fn lookup<'d>(container: &'d Document, path: &str, in_set: bool) -> Option<(&'d Bson, Slot)> {
    if let Some(v) = container.get(path) {
        return Some((v, Slot { in_set, literal: true }));
    }
    if path.contains('.') {
        return get_path(container, path).map(|v| (v, Slot { in_set, literal: false }));
    }
    None
}

/// Writes `value` for `path` into the location `slot` describes.
pub fn write_slot(target: &mut Document, path: &str, slot: Slot, value: Bson) {
    let container = if slot.in_set {
        match target.get_mut(SET) {
            Some(Bson::Document(d)) => d,
            _ => return,
        }
    } else {
        target
    };
    if slot.literal {
        container.insert(path.to_string(), value);
    } else {
        set_path(container, path, value);
    }
}

/// True when an update expression is a whole-document replacement (no `$` operators).
#[must_use]
pub fn is_replacement(update: &Document) -> bool {
    !update.keys().any(|k| k.starts_with('$'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginOptions;
    use crate::schema::Schema;
    use bson::doc;

    fn registry(paths: &[&str]) -> FieldRegistry {
        FieldRegistry::build(&Schema::new("t"), &PluginOptions::new().fields(paths.iter().copied()))
    }

    struct Rec {
        data: Document,
        modified: Vec<&'static str>,
    }

    impl TrackedRecord for Rec {
        fn is_modified(&self, path: &str) -> bool {
            self.modified.contains(&path)
        }
        fn data(&self) -> &Document {
            &self.data
        }
        fn data_mut(&mut self) -> &mut Document {
            &mut self.data
        }
    }

    #[test]
    fn record_variant_uses_modified_predicate() {
        let reg = registry(&["password", "other", "gone"]);
        let rec = Rec {
            data: doc! { "password": "pw", "other": "o" },
            modified: vec!["password", "gone"],
        };
        let cs = ChangeSet::for_record(&rec, &reg);
        assert_eq!(cs.paths().collect::<Vec<_>>(), vec!["password", "gone"]);
        assert_eq!(cs.entries()[0].value, Bson::String("pw".into()));
        assert_eq!(cs.entries()[1].value, Bson::Null);
    }

    #[test]
    fn insert_variant_requires_exact_path() {
        let reg = registry(&["password", "nested.pwd1"]);
        let with = doc! { "password": "a", "nested": { "pwd1": "b" } };
        let without_leaf = doc! { "nested": { "other": 1 } };
        assert_eq!(ChangeSet::for_insert(&with, &reg).len(), 2);
        assert!(ChangeSet::for_insert(&without_leaf, &reg).is_empty());
    }

    #[test]
    fn update_variant_merges_top_level_and_set() {
        let reg = registry(&["password"]);
        let upd = doc! { "password": "x", "$set": { "password": "x" } };
        let cs = ChangeSet::for_update(&upd, &reg);
        assert_eq!(cs.len(), 1);
        assert_eq!(cs.entries()[0].slots.len(), 2);
        assert!(cs.entries()[0].slots.iter().any(|s| s.in_set));
    }

    #[test]
    fn update_variant_ignores_parent_only_matches() {
        let reg = registry(&["nested.pwd1"]);
        let parent_only = doc! { "$set": { "nested": "flat" } };
        assert!(ChangeSet::for_update(&parent_only, &reg).is_empty());
        let literal = doc! { "$set": { "nested.pwd1": "p" } };
        let cs = ChangeSet::for_update(&literal, &reg);
        assert_eq!(cs.entries()[0].slots, vec![Slot { in_set: true, literal: true }]);
        let nested = doc! { "nested": { "pwd1": "p" } };
        let cs = ChangeSet::for_update(&nested, &reg);
        assert_eq!(cs.entries()[0].slots, vec![Slot { in_set: false, literal: false }]);
    }

    #[test]
    fn write_slot_targets_each_location() {
        let mut upd = doc! { "nested.pwd1": "p", "$set": { "a": { "b": "q" } } };
        write_slot(&mut upd, "nested.pwd1", Slot { in_set: false, literal: true }, Bson::from("H1"));
        write_slot(&mut upd, "a.b", Slot { in_set: true, literal: false }, Bson::from("H2"));
        assert_eq!(upd, doc! { "nested.pwd1": "H1", "$set": { "a": { "b": "H2" } } });
    }

    #[test]
    fn replacement_detection() {
        assert!(is_replacement(&doc! { "password": "x" }));
        assert!(!is_replacement(&doc! { "$set": { "password": "x" } }));
    }
}
