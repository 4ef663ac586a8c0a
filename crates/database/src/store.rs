//! Library store: audiobooks, notes and settings over one key-value namespace
//!
//! Every operation is a read-modify-write of a whole collection. Failures are
//! logged and degrade to empty results or dropped writes, with the single
//! exception of [`LibraryStore::add_note`], whose caller needs to know whether
//! the note was kept.

use crate::kv::KeyValueStore;
use crate::queries::{
    load_audiobooks, load_notes, load_settings, store_audiobooks, store_notes, store_settings,
};
use earmark_core::{
    AppError, Audiobook, AudiobookPatch, BookId, NewNote, Note, NoteId, Settings, SettingsPatch,
    Validator,
};
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Durable library of audiobooks, notes and settings
pub struct LibraryStore {
    kv: Arc<dyn KeyValueStore>,
    // Serializes read-modify-write cycles issued through this instance
    write_lock: Mutex<()>,
}

impl LibraryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns every audiobook, or an empty list if the collection is unreadable
    pub async fn get_audiobooks(&self) -> Vec<Audiobook> {
        match load_audiobooks(self.kv.as_ref()).await {
            Ok(books) => books,
            Err(e) => {
                log::error!("Failed to load audiobooks: {}", e);
                Vec::new()
            }
        }
    }

    /// Looks up a single audiobook by id
    pub async fn get_audiobook(&self, id: BookId) -> Option<Audiobook> {
        self.get_audiobooks().await.into_iter().find(|b| b.id == id)
    }

    /// Adds an audiobook, replacing any stored record with the same id
    pub async fn add_audiobook(&self, book: Audiobook) {
        if let Err(errors) = book.validate() {
            log::warn!("Storing audiobook {} with problems: {:?}", book.id, errors);
        }

        let _guard = self.write_lock.lock().await;
        let result = async {
            let mut books = load_audiobooks(self.kv.as_ref()).await?;
            let id = book.id;
            match books.iter_mut().find(|b| b.id == id) {
                Some(existing) => *existing = book,
                None => books.push(book),
            }
            store_audiobooks(self.kv.as_ref(), &books).await?;
            log::info!("Added audiobook {}", id);
            Ok::<_, AppError>(())
        }
        .await;

        if let Err(e) = result {
            log::error!("Failed to add audiobook: {}", e);
        }
    }

    /// Applies a partial update; unknown ids are ignored
    ///
    /// Selecting a part through the patch re-mirrors the book's `uri`.
    pub async fn update_audiobook(&self, id: BookId, patch: &AudiobookPatch) {
        if patch.is_empty() {
            return;
        }

        let _guard = self.write_lock.lock().await;
        let result = async {
            let mut books = load_audiobooks(self.kv.as_ref()).await?;
            let Some(book) = books.iter_mut().find(|b| b.id == id) else {
                log::debug!("Ignoring update for unknown audiobook {}", id);
                return Ok(());
            };
            book.apply(patch);
            store_audiobooks(self.kv.as_ref(), &books).await?;
            Ok::<_, AppError>(())
        }
        .await;

        if let Err(e) = result {
            log::error!("Failed to update audiobook {}: {}", id, e);
        }
    }

    /// Deletes an audiobook and every note attached to it
    pub async fn delete_audiobook(&self, id: BookId) {
        let _guard = self.write_lock.lock().await;

        let books_result = async {
            let mut books = load_audiobooks(self.kv.as_ref()).await?;
            let before = books.len();
            books.retain(|b| b.id != id);
            if books.len() != before {
                store_audiobooks(self.kv.as_ref(), &books).await?;
            }
            Ok::<_, AppError>(())
        }
        .await;

        if let Err(e) = books_result {
            log::error!("Failed to delete audiobook {}: {}", id, e);
            return;
        }

        let notes_result = async {
            let mut notes = load_notes(self.kv.as_ref()).await?;
            let before = notes.len();
            notes.retain(|n| n.audiobook_id != id);
            if notes.len() != before {
                store_notes(self.kv.as_ref(), &notes).await?;
                log::debug!("Removed {} notes of audiobook {}", before - notes.len(), id);
            }
            Ok::<_, AppError>(())
        }
        .await;

        match notes_result {
            Ok(()) => log::info!("Deleted audiobook {}", id),
            Err(e) => log::error!("Deleted audiobook {} but not its notes: {}", id, e),
        }
    }

    /// Returns the notes of one audiobook, ascending by position
    pub async fn get_notes(&self, audiobook_id: BookId) -> Vec<Note> {
        let notes = match load_notes(self.kv.as_ref()).await {
            Ok(notes) => notes,
            Err(e) => {
                log::error!("Failed to load notes: {}", e);
                return Vec::new();
            }
        };

        let mut notes: Vec<Note> = notes
            .into_iter()
            .filter(|n| n.audiobook_id == audiobook_id)
            .collect();
        notes.sort_by(|a, b| {
            a.position_seconds
                .partial_cmp(&b.position_seconds)
                .unwrap_or(Ordering::Equal)
                .then(a.created_at.cmp(&b.created_at))
        });
        notes
    }

    /// Stores a new note, assigning its id and creation time
    ///
    /// Unlike the other operations, failures are returned to the caller.
    pub async fn add_note(&self, new_note: NewNote) -> Result<Note, AppError> {
        new_note
            .validate()
            .map_err(|errors| AppError::InvalidArgument {
                argument: "note".to_string(),
                reason: errors.join("; "),
            })?;

        let _guard = self.write_lock.lock().await;
        let mut notes = load_notes(self.kv.as_ref()).await?;
        let note = new_note.into_note();
        notes.push(note.clone());
        store_notes(self.kv.as_ref(), &notes).await?;

        log::debug!("Added {:?} {} to audiobook {}", note.kind, note.id, note.audiobook_id);
        Ok(note)
    }

    /// Deletes one note; unknown ids are ignored
    pub async fn delete_note(&self, id: NoteId) {
        let _guard = self.write_lock.lock().await;
        let result = async {
            let mut notes = load_notes(self.kv.as_ref()).await?;
            let before = notes.len();
            notes.retain(|n| n.id != id);
            if notes.len() != before {
                store_notes(self.kv.as_ref(), &notes).await?;
            }
            Ok::<_, AppError>(())
        }
        .await;

        if let Err(e) = result {
            log::error!("Failed to delete note {}: {}", id, e);
        }
    }

    /// Returns stored settings merged over defaults; never fails
    pub async fn get_settings(&self) -> Settings {
        match load_settings(self.kv.as_ref()).await {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings: {}", e);
                Settings::default()
            }
        }
    }

    /// Merges `patch` over the stored settings and returns the result
    ///
    /// The merged settings are returned even if they could not be persisted.
    pub async fn save_settings(&self, patch: &SettingsPatch) -> Settings {
        let _guard = self.write_lock.lock().await;
        let mut settings = self.get_settings().await;
        settings.merge(patch);

        if let Err(errors) = settings.validate() {
            log::warn!("Saving settings with problems: {:?}", errors);
        }

        if let Err(e) = store_settings(self.kv.as_ref(), &settings).await {
            log::error!("Failed to save settings: {}", e);
        }
        settings
    }
}
