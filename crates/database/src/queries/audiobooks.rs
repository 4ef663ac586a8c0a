//! Audiobook collection persistence

use crate::kv::KeyValueStore;
use crate::schema::{decode_collection, encode_collection, AUDIOBOOKS_KEY};
use earmark_core::{AppError, Audiobook};

/// Loads every stored audiobook; a missing collection is empty
pub async fn load_audiobooks(kv: &dyn KeyValueStore) -> Result<Vec<Audiobook>, AppError> {
    match kv.get(AUDIOBOOKS_KEY).await? {
        Some(raw) => decode_collection(AUDIOBOOKS_KEY, &raw),
        None => Ok(Vec::new()),
    }
}

/// Replaces the stored audiobook collection
pub async fn store_audiobooks(
    kv: &dyn KeyValueStore,
    books: &[Audiobook],
) -> Result<(), AppError> {
    let raw = encode_collection(books)?;
    kv.set(AUDIOBOOKS_KEY, &raw).await
}
