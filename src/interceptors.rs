//! Pre-operation interceptors: build the change set, fan the hashes out, write them back.
//!
//! Every changed field either goes through the hash pipeline or, when it does not hold a
//! string, is cleared to `""` straight away. The operation may only proceed once every
//! result has been written back; the first failure aborts it.

use crate::changeset::{ChangeSet, Slot, write_slot};
use crate::crypto::SecretHasher;
use crate::errors::Result;
use crate::path::set_path;
use crate::pipeline::HashFanOut;
use crate::registry::{FieldRegistry, FieldSpec};
use crate::schema::{HookFuture, HookPoint, HookTarget, PreHook, TrackedRecord};
use bson::{Bson, Document};
use std::sync::Arc;

pub struct FieldHashHook<H> {
    registry: Arc<FieldRegistry>,
    hasher: Arc<H>,
}

impl<H: SecretHasher> FieldHashHook<H> {
    #[must_use]
    pub const fn new(registry: Arc<FieldRegistry>, hasher: Arc<H>) -> Self {
        Self { registry, hasher }
    }

    /// Single-document save: hashes the fields the record reports as modified.
    pub async fn pre_save(&self, record: &mut dyn TrackedRecord) -> Result<()> {
        let changes = ChangeSet::for_record(&*record, &self.registry);
        if changes.is_empty() {
            return Ok(());
        }
        log::debug!("save: hashing {:?}", changes.paths().collect::<Vec<_>>());
        let mut targets: Vec<&FieldSpec> = Vec::with_capacity(changes.len());
        let mut items = Vec::with_capacity(changes.len());
        for (idx, entry) in changes.into_entries().into_iter().enumerate() {
            items.push((idx, entry.value, entry.field.rounds()));
            targets.push(entry.field);
        }
        let data = record.data_mut();
        self.drive(items, |idx: usize, value| {
            set_path(data, targets[idx].path(), value);
        })
        .await
    }

    /// Bulk insert: hashes every document of the batch and completes once all are done.
    pub async fn pre_insert_many(&self, docs: &mut [Document]) -> Result<()> {
        let mut targets: Vec<Vec<&FieldSpec>> = Vec::with_capacity(docs.len());
        let mut items = Vec::new();
        for (doc_idx, doc) in docs.iter().enumerate() {
            let changes = ChangeSet::for_insert(doc, &self.registry);
            let mut fields = Vec::with_capacity(changes.len());
            for (field_idx, entry) in changes.into_entries().into_iter().enumerate() {
                items.push(((doc_idx, field_idx), entry.value, entry.field.rounds()));
                fields.push(entry.field);
            }
            targets.push(fields);
        }
        if items.is_empty() {
            return Ok(());
        }
        log::debug!("insertMany: hashing {} field(s) across {} document(s)", items.len(), docs.len());
        self.drive(items, |(doc_idx, field_idx): (usize, usize), value| {
            set_path(&mut docs[doc_idx], targets[doc_idx][field_idx].path(), value);
        })
        .await
    }

    /// Update expression or replacement document: hashes fields set at the top level or
    /// under `$set`, once per field.
    pub async fn pre_update(&self, update: &mut Document) -> Result<()> {
        let changes = ChangeSet::for_update(update, &self.registry);
        if changes.is_empty() {
            return Ok(());
        }
        log::debug!("update: hashing {:?}", changes.paths().collect::<Vec<_>>());
        let mut targets: Vec<(&FieldSpec, Vec<Slot>)> = Vec::with_capacity(changes.len());
        let mut items = Vec::with_capacity(changes.len());
        for (idx, entry) in changes.into_entries().into_iter().enumerate() {
            items.push((idx, entry.value, entry.field.rounds()));
            targets.push((entry.field, entry.slots));
        }
        self.drive(items, |idx: usize, value: Bson| {
            let (field, slots) = &targets[idx];
            for slot in slots {
                write_slot(update, field.path(), *slot, value.clone());
            }
        })
        .await
    }

    async fn drive<K, W>(&self, items: Vec<(K, Bson, u32)>, mut write: W) -> Result<()>
    where
        K: Send + 'static,
        W: FnMut(K, Bson) + Send,
    {
        let mut fan = HashFanOut::new();
        for (key, value, rounds) in items {
            match value {
                Bson::String(s) => fan.spawn(&self.hasher, key, s, rounds),
                _ => write(key, Bson::String(String::new())),
            }
        }
        while let Some(done) = fan.next().await {
            let (key, hash) = done?;
            write(key, Bson::String(hash));
        }
        Ok(())
    }
}

impl<H: SecretHasher> PreHook for FieldHashHook<H> {
    fn name(&self) -> &str {
        "fieldhash"
    }

    fn run<'a>(&'a self, point: HookPoint, target: HookTarget<'a>) -> HookFuture<'a> {
        Box::pin(async move {
            let res = match target {
                HookTarget::Save(record) => self.pre_save(record).await,
                HookTarget::InsertMany(docs) => self.pre_insert_many(docs).await,
                HookTarget::Update(update) => self.pre_update(update).await,
            };
            if let Err(e) = &res {
                log::warn!("{point}: hashing aborted: {e}");
            }
            res
        })
    }
}
