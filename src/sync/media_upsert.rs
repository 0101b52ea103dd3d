use crate::sync::store::{MediaRecord, SyncStore};
use crate::sync::types::NormalizedMedia;
use crate::sync::{Result, SyncError};

/// Persist one normalized item as a canonical media row.
///
/// Items with no usable title or provider linkage are rejected before any
/// write; the orchestrator catches this per item.
pub async fn insert_media(store: &dyn SyncStore, item: &NormalizedMedia) -> Result<MediaRecord> {
    if item.title.trim().is_empty() {
        return Err(SyncError::InvalidItem(
            "media item cannot be inserted without a title".to_string(),
        ));
    }

    if item.provider_id.trim().is_empty() {
        return Err(SyncError::InvalidItem(
            "media item is missing provider metadata for insertion".to_string(),
        ));
    }

    store.upsert_media(item).await
}
