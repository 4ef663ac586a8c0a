//! Domain types for Earmark
//!
//! This module contains all domain models organized by responsibility:
//! - `book`: Audiobook, parts and partial updates
//! - `note`: Notes and bookmarks
//! - `playback`: Transport state, rate and the playback snapshot
//! - `settings`: Persisted listener preferences
//! - `common`: Timestamps, listening time and the `Validator` trait

mod book;
mod common;
mod note;
mod playback;
mod settings;

// Re-export all public types
pub use book::{Audiobook, AudiobookPart, AudiobookPatch, BookId};
pub use common::{ListeningTime, Timestamp, Validator};
pub use note::{NewNote, Note, NoteId, NoteKind};
pub use playback::{PlaybackRate, PlaybackSnapshot, PlayerState};
pub use settings::{Settings, SettingsPatch};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let _book_id: BookId = BookId::new();
        let _note_id: NoteId = NoteId::new();
        let _snapshot: PlaybackSnapshot = PlaybackSnapshot::default();
        let _settings: Settings = Settings::default();
    }

    #[test]
    fn test_listening_time_formatting() {
        assert_eq!(ListeningTime::from_seconds(3665.0).to_string(), "1:01:05");
    }
}
