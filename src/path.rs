//! Dotted field paths over BSON documents.
//!
//! `get_path` never fails: a missing or non-document intermediate segment ends the walk with
//! `None`. `set_path` materialises every missing (or non-document) intermediate level as an
//! empty sub-document before writing the leaf.

use bson::{Bson, Document};

/// Splits a dotted path into its segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> + Clone {
    path.split('.')
}

/// Reads the value stored at `path`.
#[must_use]
pub fn get_path<'a>(root: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut cur = root;
    let mut iter = segments(path).peekable();
    while let Some(seg) = iter.next() {
        if iter.peek().is_none() {
            return cur.get(seg);
        }
        match cur.get(seg) {
            Some(Bson::Document(d)) => cur = d,
            _ => return None,
        }
    }
    None
}

/// True when a value (including `null`) is stored at exactly `path`.
#[must_use]
pub fn has_path(root: &Document, path: &str) -> bool {
    get_path(root, path).is_some()
}

fn ensure_subdoc<'a>(root: &'a mut Document, key: &str) -> &'a mut Document {
    let slot = root.entry(key.to_string()).or_insert_with(|| Bson::Document(Document::new()));
    if !matches!(slot, Bson::Document(_)) {
        *slot = Bson::Document(Document::new());
    }
    match slot {
        Bson::Document(d) => d,
        _ => unreachable!(),
    }
}

/// Writes `value` at `path`, returning the value it replaced.
pub fn set_path(root: &mut Document, path: &str, value: impl Into<Bson>) -> Option<Bson> {
    let mut cur = root;
    let mut iter = segments(path).peekable();
    while let Some(seg) = iter.next() {
        if iter.peek().is_none() {
            return cur.insert(seg.to_string(), value.into());
        }
        cur = ensure_subdoc(cur, seg);
    }
    None
}

/// Removes the value at `path` if every intermediate level exists.
pub fn unset_path(root: &mut Document, path: &str) -> Option<Bson> {
    let mut cur = root;
    let mut iter = segments(path).peekable();
    while let Some(seg) = iter.next() {
        if iter.peek().is_none() {
            return cur.remove(seg);
        }
        match cur.get_mut(seg) {
            Some(Bson::Document(d)) => cur = d,
            _ => return None,
        }
    }
    None
}

/// Camel-cases a dotted path: `nested.pwd1` becomes `NestedPwd1`.
#[must_use]
pub fn camel_case(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for seg in segments(path) {
        let mut chars = seg.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
