//! Filters and update expressions for the bundled collection.

use crate::errors::{FieldHashError, Result};
use crate::path::{get_path, set_path, unset_path};
use bson::{Bson, Document as BsonDocument};

#[derive(Debug, Clone)]
pub enum Filter {
    True,
    Eq { path: String, value: Bson },
    And(Vec<Filter>),
}

impl Filter {
    #[must_use]
    pub fn eq(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::Eq { path: path.into(), value: value.into() }
    }

    #[must_use]
    pub fn matches(&self, doc: &BsonDocument) -> bool {
        match self {
            Self::True => true,
            Self::Eq { path, value } => get_path(doc, path) == Some(value),
            Self::And(fs) => fs.iter().all(|f| f.matches(doc)),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateDoc {
    pub set: Vec<(String, Bson)>,
    pub inc: Vec<(String, f64)>,
    pub unset: Vec<String>,
}

impl UpdateDoc {
    /// Parses an update expression. Keys without a `$` prefix are treated as `$set`.
    pub fn from_expression(expr: &BsonDocument) -> Result<Self> {
        let mut out = Self::default();
        for (k, v) in expr {
            match (k.as_str(), v) {
                ("$set", Bson::Document(d)) => {
                    out.set.extend(d.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                ("$inc", Bson::Document(d)) => {
                    for (k, v) in d {
                        let by = as_f64(v).ok_or_else(|| {
                            FieldHashError::Query(format!("$inc value for {k} is not numeric"))
                        })?;
                        out.inc.push((k.clone(), by));
                    }
                }
                ("$unset", Bson::Document(d)) => out.unset.extend(d.keys().cloned()),
                ("$unset", Bson::Array(a)) => {
                    out.unset.extend(a.iter().filter_map(Bson::as_str).map(str::to_string));
                }
                (op, _) if op.starts_with('$') => {
                    return Err(FieldHashError::Query(format!("unsupported update operator {op}")));
                }
                (k, v) => out.set.push((k.to_string(), v.clone())),
            }
        }
        Ok(out)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.inc.is_empty() && self.unset.is_empty()
    }
}

fn as_f64(v: &Bson) -> Option<f64> {
    match v {
        Bson::Double(f) => Some(*f),
        Bson::Int32(i) => Some(f64::from(*i)),
        #[allow(clippy::cast_precision_loss)]
        Bson::Int64(i) => Some(*i as f64),
        _ => None,
    }
}

/// Applies `upd` in place and reports whether anything changed.
pub fn apply_update(doc: &mut BsonDocument, upd: &UpdateDoc) -> bool {
    let mut changed = false;
    for (k, v) in &upd.set {
        if set_path(doc, k, v.clone()).as_ref() != Some(v) {
            changed = true;
        }
    }
    for (k, by) in &upd.inc {
        let cur = get_path(doc, k).and_then(as_f64).unwrap_or(0.0);
        set_path(doc, k, Bson::Double(cur + by));
        changed = true;
    }
    for k in &upd.unset {
        if unset_path(doc, k).is_some() {
            changed = true;
        }
    }
    changed
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub matched: u64,
    pub modified: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn top_level_keys_are_set() {
        let u = UpdateDoc::from_expression(&doc! { "a": 1, "$set": { "b.c": "x" } }).unwrap();
        assert_eq!(u.set, vec![("a".to_string(), Bson::Int32(1)), ("b.c".to_string(), Bson::from("x"))]);
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let err = UpdateDoc::from_expression(&doc! { "$push": { "a": 1 } }).unwrap_err();
        assert!(matches!(err, FieldHashError::Query(_)));
    }

    #[test]
    fn update_doc_set_inc_unset() {
        let mut d = doc! { "x": 1, "y": 2, "z": 3 };
        let ud = UpdateDoc {
            set: vec![("y".into(), Bson::Int32(5))],
            inc: vec![("x".into(), 2.0)],
            unset: vec!["z".into()],
        };
        assert!(apply_update(&mut d, &ud));
        assert_eq!(d, doc! { "x": 3.0, "y": 5 });
    }

    #[test]
    fn filter_matches_nested_paths() {
        let d = doc! { "name": "a", "n": { "k": 1 } };
        assert!(Filter::And(vec![Filter::eq("name", "a"), Filter::eq("n.k", 1)]).matches(&d));
        assert!(!Filter::eq("n.k", 2).matches(&d));
        assert!(Filter::True.matches(&d));
    }
}
