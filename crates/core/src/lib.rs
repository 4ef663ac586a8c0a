//! Earmark core domain types
//!
//! Shared records (audiobooks, parts, notes, settings), the playback snapshot
//! published by the session layer, and the workspace-wide [`AppError`].

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ErrorSeverity, RecoveryAction, Result};
pub use types::{
    Audiobook, AudiobookPart, AudiobookPatch, BookId, ListeningTime, NewNote, Note, NoteId, NoteKind,
    PlaybackRate, PlaybackSnapshot, PlayerState, Settings, SettingsPatch, Timestamp, Validator,
};
