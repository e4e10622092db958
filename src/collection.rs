//! In-memory collection that runs schema pre-hooks before every write.
//!
//! A hook failure aborts the operation before anything is stored.

use crate::changeset::is_replacement;
use crate::document::{Document, Metadata};
use crate::errors::{FieldHashError, Result};
use crate::query::{Filter, UpdateDoc, UpdateReport, apply_update};
use crate::schema::{HookPoint, HookTarget, Schema, UpdateKind};
use crate::types::DocumentId;
use bson::Document as BsonDocument;
use chrono::Utc;
use parking_lot::RwLock;

pub struct Collection {
    schema: Schema,
    docs: RwLock<Vec<Document>>,
}

impl Collection {
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self { schema, docs: RwLock::new(Vec::new()) }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Runs the save hooks, then inserts or replaces the record. The record is clean afterwards.
    pub async fn save(&self, doc: &mut Document) -> Result<DocumentId> {
        for hook in self.schema.hooks(HookPoint::Save) {
            hook.run(HookPoint::Save, HookTarget::Save(&mut *doc)).await?;
        }
        doc.mark_clean();
        let stored = Document::from_stored(doc.id, doc.data().clone(), doc.metadata.clone());
        let mut docs = self.docs.write();
        match docs.iter_mut().find(|d| d.id == doc.id) {
            Some(slot) => *slot = stored,
            None => docs.push(stored),
        }
        log::debug!("{}: saved {}", self.name(), doc.id);
        Ok(doc.id)
    }

    /// Runs the bulk-insert hooks over the whole batch, then stores every document.
    pub async fn insert_many(&self, mut batch: Vec<BsonDocument>) -> Result<Vec<DocumentId>> {
        for hook in self.schema.hooks(HookPoint::InsertMany) {
            hook.run(HookPoint::InsertMany, HookTarget::InsertMany(&mut batch)).await?;
        }
        let stored: Vec<Document> = batch
            .into_iter()
            .map(|data| Document::from_stored(DocumentId::new(), data, Metadata::new()))
            .collect();
        let ids = stored.iter().map(|d| d.id).collect::<Vec<_>>();
        self.docs.write().extend(stored);
        log::debug!("{}: inserted {} document(s)", self.name(), ids.len());
        Ok(ids)
    }

    #[must_use]
    pub fn find_by_id(&self, id: &DocumentId) -> Option<Document> {
        self.docs.read().iter().find(|d| d.id == *id).cloned()
    }

    #[must_use]
    pub fn find_one(&self, filter: &Filter) -> Option<Document> {
        self.docs.read().iter().find(|d| filter.matches(d.data())).cloned()
    }

    #[must_use]
    pub fn find(&self, filter: &Filter) -> Vec<Document> {
        self.docs.read().iter().filter(|d| filter.matches(d.data())).cloned().collect()
    }

    #[must_use]
    pub fn count(&self, filter: &Filter) -> usize {
        self.docs.read().iter().filter(|d| filter.matches(d.data())).count()
    }

    /// Updates the first match.
    pub async fn update(&self, filter: &Filter, update: BsonDocument) -> Result<UpdateReport> {
        Ok(self.run_update(UpdateKind::Update, filter, update, Some(1)).await?.0)
    }

    pub async fn update_one(&self, filter: &Filter, update: BsonDocument) -> Result<UpdateReport> {
        Ok(self.run_update(UpdateKind::UpdateOne, filter, update, Some(1)).await?.0)
    }

    pub async fn update_many(&self, filter: &Filter, update: BsonDocument) -> Result<UpdateReport> {
        Ok(self.run_update(UpdateKind::UpdateMany, filter, update, None).await?.0)
    }

    /// Updates the first match and returns it as updated.
    pub async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: BsonDocument,
    ) -> Result<Option<Document>> {
        Ok(self.run_update(UpdateKind::FindOneAndUpdate, filter, update, Some(1)).await?.1)
    }

    /// Replaces the data of the first match, keeping its id.
    pub async fn replace_one(&self, filter: &Filter, replacement: BsonDocument) -> Result<UpdateReport> {
        if !is_replacement(&replacement) {
            return Err(FieldHashError::Query("replacement may not contain update operators".into()));
        }
        Ok(self.run_update(UpdateKind::ReplaceOne, filter, replacement, Some(1)).await?.0)
    }

    async fn run_update(
        &self,
        kind: UpdateKind,
        filter: &Filter,
        mut update: BsonDocument,
        limit: Option<usize>,
    ) -> Result<(UpdateReport, Option<Document>)> {
        let point = HookPoint::Update(kind);
        for hook in self.schema.hooks(point) {
            hook.run(point, HookTarget::Update(&mut update)).await?;
        }
        let parsed = match kind {
            UpdateKind::ReplaceOne => None,
            _ => Some(UpdateDoc::from_expression(&update)?),
        };
        let mut report = UpdateReport::default();
        let mut last = None;
        let mut docs = self.docs.write();
        for doc in docs.iter_mut().filter(|d| filter.matches(d.data())).take(limit.unwrap_or(usize::MAX)) {
            report.matched += 1;
            let mut data = doc.data().clone();
            let changed = match &parsed {
                Some(upd) => apply_update(&mut data, upd),
                None => {
                    let changed = data != update;
                    data = update.clone();
                    changed
                }
            };
            if changed {
                report.modified += 1;
                let mut metadata = doc.metadata.clone();
                metadata.updated_at = Utc::now();
                *doc = Document::from_stored(doc.id, data, metadata);
            }
            last = Some(doc.clone());
        }
        log::debug!("{}: {point} matched {} modified {}", self.name(), report.matched, report.modified);
        Ok((report, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[tokio::test]
    async fn save_then_update_without_hooks() {
        let col = Collection::new(Schema::new("plain"));
        let mut d = Document::new(doc! { "name": "a", "n": 1 });
        let id = col.save(&mut d).await.unwrap();
        assert!(!d.is_new());
        let r = col.update_one(&Filter::eq("name", "a"), doc! { "$inc": { "n": 2 } }).await.unwrap();
        assert_eq!(r, UpdateReport { matched: 1, modified: 1 });
        assert_eq!(col.find_by_id(&id).unwrap().get("n"), Some(&bson::Bson::Double(3.0)));
    }

    #[tokio::test]
    async fn replace_rejects_operators() {
        let col = Collection::new(Schema::new("plain"));
        let err = col.replace_one(&Filter::True, doc! { "$set": { "a": 1 } }).await.unwrap_err();
        assert!(matches!(err, FieldHashError::Query(_)));
    }

    #[tokio::test]
    async fn update_many_touches_every_match() {
        let col = Collection::new(Schema::new("plain"));
        col.insert_many(vec![doc! { "k": 1 }, doc! { "k": 1 }, doc! { "k": 2 }]).await.unwrap();
        let r = col.update_many(&Filter::eq("k", 1), doc! { "tag": "x" }).await.unwrap();
        assert_eq!(r.matched, 2);
        assert_eq!(col.count(&Filter::eq("tag", "x")), 2);
    }
}
