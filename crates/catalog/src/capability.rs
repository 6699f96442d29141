//! Capability seams toward the surrounding system.
//!
//! The controllers consume these interfaces and nothing else: transport,
//! persistence, and the shareable filter surface. Implementations live with
//! the embedding application; tests script them directly.

use async_trait::async_trait;
use folio_sync::fetch::FetchError;
use folio_sync::form::{EntityId, EntityPayload, FieldMap};

use crate::error::SaveError;

pub use folio_sync::fetch::{FetchKey, FetchPage, PageFetcher};
pub use folio_sync::query::{FilterStore, MemoryFilterStore};

/// Load/save capability for one editable entity kind.
///
/// `save` returns the store's canonical echo of what was actually persisted
/// (trimmed text, blank-filtered lists); the form controller installs that
/// echo as the new baseline, never the raw submitted values.
#[async_trait]
pub trait EntityStore: Send + Sync {
	async fn load(&self, id: EntityId) -> Result<EntityPayload, FetchError>;
	async fn save(&self, id: EntityId, fields: &FieldMap) -> Result<FieldMap, SaveError>;
}
