//! Pre-operation hooks and the record capability they operate on.

use super::types::HookPoint;
use crate::errors::Result;
use std::future::Future;
use std::pin::Pin;

/// A record that knows which of its paths changed since it was loaded or last saved.
pub trait TrackedRecord: Send + Sync {
    fn is_modified(&self, path: &str) -> bool;
    fn data(&self) -> &bson::Document;
    fn data_mut(&mut self) -> &mut bson::Document;
}

/// What a hook receives, depending on the persistence entry point.
pub enum HookTarget<'a> {
    Save(&'a mut dyn TrackedRecord),
    InsertMany(&'a mut [bson::Document]),
    Update(&'a mut bson::Document),
}

pub type HookFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Runs before a persistence operation; an error aborts the operation.
pub trait PreHook: Send + Sync {
    fn name(&self) -> &str;
    fn run<'a>(&'a self, point: HookPoint, target: HookTarget<'a>) -> HookFuture<'a>;
}
