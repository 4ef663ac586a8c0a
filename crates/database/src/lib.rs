//! Earmark Database Layer
//!
//! Durable storage for the audiobook library. Collections are kept as JSON
//! documents in a string key-value store; [`SqliteKvStore`] is the on-disk
//! backend and [`MemoryKvStore`] the volatile one. [`LibraryStore`] is the
//! entry point the rest of the application uses.

pub mod connection;
pub mod kv;
pub mod migrations;
pub mod queries;
pub mod schema;
pub mod store;

pub use connection::{DatabaseConfig, DbPool};
pub use kv::{KeyValueStore, MemoryKvStore, SqliteKvStore};
pub use migrations::{current_version, run_migrations, verify_integrity};
pub use schema::{AUDIOBOOKS_KEY, NOTES_KEY, SCHEMA_VERSION, SETTINGS_KEY};
pub use store::LibraryStore;

#[cfg(test)]
mod tests {
    use super::*;
    use earmark_core::{Audiobook, AudiobookPatch, NewNote};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_library_workflow_on_sqlite() {
        let kv = SqliteKvStore::in_memory().await.unwrap();
        verify_integrity(kv.pool()).await.unwrap();
        let store = LibraryStore::new(Arc::new(kv));

        let book = Audiobook::new("Workflow", "file:///workflow.mp3");
        store.add_audiobook(book.clone()).await;
        store
            .update_audiobook(book.id, &AudiobookPatch::new().position(61.0).finished(false))
            .await;
        let note = store
            .add_note(NewNote::bookmark(book.id, 61.0, "here"))
            .await
            .unwrap();

        let stored = store.get_audiobook(book.id).await.unwrap();
        assert_eq!(stored.current_position_seconds, 61.0);
        assert_eq!(store.get_notes(book.id).await, vec![note]);
    }
}
