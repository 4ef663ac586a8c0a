//! Note collection persistence

use crate::kv::KeyValueStore;
use crate::schema::{decode_collection, encode_collection, NOTES_KEY};
use earmark_core::{AppError, Note};

/// Loads every stored note across all audiobooks
pub async fn load_notes(kv: &dyn KeyValueStore) -> Result<Vec<Note>, AppError> {
    match kv.get(NOTES_KEY).await? {
        Some(raw) => decode_collection(NOTES_KEY, &raw),
        None => Ok(Vec::new()),
    }
}

/// Replaces the stored note collection
pub async fn store_notes(kv: &dyn KeyValueStore, notes: &[Note]) -> Result<(), AppError> {
    let raw = encode_collection(notes)?;
    kv.set(NOTES_KEY, &raw).await
}
