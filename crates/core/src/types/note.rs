//! Note and bookmark domain model

use crate::types::{BookId, Timestamp, Validator};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Creates a new random NoteId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a NoteId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Returns the NoteId as a string
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an entry is a free-text note or a position bookmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    #[default]
    Note,
    Bookmark,
}

/// A note or bookmark pinned to a position in an audiobook
///
/// Notes are append-only: they can be created and deleted, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub audiobook_id: BookId,
    pub position_seconds: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub kind: NoteKind,
    #[serde(default = "Timestamp::now")]
    pub created_at: Timestamp,
}

/// Caller-supplied part of a note; id and creation time are assigned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub audiobook_id: BookId,
    pub position_seconds: f64,
    pub text: String,
    pub kind: NoteKind,
}

impl NewNote {
    /// Creates a free-text note
    pub fn note(audiobook_id: BookId, position_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            audiobook_id,
            position_seconds,
            text: text.into(),
            kind: NoteKind::Note,
        }
    }

    /// Creates a bookmark, optionally labelled
    pub fn bookmark(audiobook_id: BookId, position_seconds: f64, label: impl Into<String>) -> Self {
        Self {
            audiobook_id,
            position_seconds,
            text: label.into(),
            kind: NoteKind::Bookmark,
        }
    }

    /// Materialises the note with a fresh id and creation time
    pub fn into_note(self) -> Note {
        Note {
            id: NoteId::new(),
            audiobook_id: self.audiobook_id,
            position_seconds: self.position_seconds.max(0.0),
            text: self.text,
            kind: self.kind,
            created_at: Timestamp::now(),
        }
    }
}

impl Validator for NewNote {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.position_seconds.is_finite() || self.position_seconds < 0.0 {
            errors.push("Note position must be a non-negative number of seconds".to_string());
        }

        if self.kind == NoteKind::Note && self.text.trim().is_empty() {
            errors.push("Note text cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
