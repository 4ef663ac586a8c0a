//! Audiobook and part domain models

use crate::types::{Timestamp, Validator};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an audiobook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    /// Creates a new random BookId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a BookId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Returns the BookId as a string
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for BookId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One physical audio file belonging to a logical audiobook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudiobookPart {
    pub uri: String,
    pub filename: String,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub part_number: Option<u32>,
}

impl AudiobookPart {
    pub fn new(uri: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            filename: filename.into(),
            duration_seconds: None,
            part_number: None,
        }
    }

    pub fn with_part_number(mut self, number: u32) -> Self {
        self.part_number = Some(number);
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}

/// A logical, user-facing library entry, possibly backed by several parts
///
/// `current_position_seconds` is always relative to the currently selected
/// part. When `parts` holds more than one entry, `uri` mirrors
/// `parts[current_part_index].uri`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audiobook {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    pub uri: String,
    #[serde(default)]
    pub parts: Option<Vec<AudiobookPart>>,
    #[serde(default)]
    pub total_duration_seconds: Option<f64>,
    #[serde(default)]
    pub artwork_uri: Option<String>,
    #[serde(default)]
    pub current_position_seconds: f64,
    #[serde(default)]
    pub current_part_index: Option<usize>,
    #[serde(default)]
    pub last_played_at: Option<Timestamp>,
    #[serde(default)]
    pub is_finished: Option<bool>,
    #[serde(default = "Timestamp::now")]
    pub added_at: Timestamp,
}

impl Audiobook {
    /// Creates a single-file audiobook
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: BookId::new(),
            title: title.into(),
            author: None,
            uri: uri.into(),
            parts: None,
            total_duration_seconds: None,
            artwork_uri: None,
            current_position_seconds: 0.0,
            current_part_index: None,
            last_played_at: None,
            is_finished: None,
            added_at: Timestamp::now(),
        }
    }

    /// Creates an audiobook from an ordered, non-empty part list
    ///
    /// Returns `None` when `parts` is empty.
    pub fn from_parts(title: impl Into<String>, parts: Vec<AudiobookPart>) -> Option<Self> {
        let first_uri = parts.first()?.uri.clone();
        let mut book = Self::new(title, first_uri);
        let total: Option<f64> = parts.iter().map(|p| p.duration_seconds).sum();
        book.total_duration_seconds = total;
        if parts.len() > 1 {
            book.current_part_index = Some(0);
        }
        book.parts = Some(parts);
        Some(book)
    }

    /// Returns true if this book is backed by more than one file
    pub fn is_multi_part(&self) -> bool {
        self.part_count() > 1
    }

    /// Number of physical parts (1 for single-file books)
    pub fn part_count(&self) -> usize {
        self.parts.as_ref().map_or(1, |p| p.len().max(1))
    }

    /// The selected part index, clamped into the valid range
    pub fn resolved_part_index(&self) -> usize {
        match &self.parts {
            Some(parts) if parts.len() > 1 => {
                let index = self.current_part_index.unwrap_or(0);
                if index < parts.len() {
                    index
                } else {
                    0
                }
            }
            _ => 0,
        }
    }

    /// The currently selected part, if the book has a part list
    pub fn current_part(&self) -> Option<&AudiobookPart> {
        self.parts
            .as_ref()
            .and_then(|parts| parts.get(self.resolved_part_index()))
    }

    /// The location playback should start from
    pub fn current_uri(&self) -> &str {
        match self.current_part() {
            Some(part) if self.is_multi_part() => &part.uri,
            _ => &self.uri,
        }
    }

    /// Selects a part and re-mirrors `uri`
    ///
    /// Returns false (leaving the book untouched) for out-of-range indices or
    /// single-part books.
    pub fn select_part(&mut self, index: usize) -> bool {
        let uri = match &self.parts {
            Some(parts) if parts.len() > 1 => match parts.get(index) {
                Some(part) => part.uri.clone(),
                None => return false,
            },
            _ => return false,
        };
        self.current_part_index = Some(index);
        self.uri = uri;
        true
    }

    /// Applies a partial update in place
    pub fn apply(&mut self, patch: &AudiobookPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(author) = &patch.author {
            self.author = author.clone();
        }
        if let Some(artwork) = &patch.artwork_uri {
            self.artwork_uri = artwork.clone();
        }
        if let Some(total) = patch.total_duration_seconds {
            self.total_duration_seconds = Some(total);
        }
        if let Some(position) = patch.current_position_seconds {
            self.current_position_seconds = position.max(0.0);
        }
        if let Some(index) = patch.current_part_index {
            self.select_part(index);
        }
        if let Some(at) = patch.last_played_at {
            self.last_played_at = Some(at);
        }
        if let Some(finished) = patch.is_finished {
            self.is_finished = Some(finished);
        }
    }

    /// Stamps the last-played time
    pub fn mark_played(&mut self) {
        self.last_played_at = Some(Timestamp::now());
    }

    /// Returns true if the book was marked finished
    pub fn finished(&self) -> bool {
        self.is_finished.unwrap_or(false)
    }
}

impl Validator for Audiobook {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push("Title cannot be empty".to_string());
        }

        if self.uri.trim().is_empty() {
            errors.push("Uri cannot be empty".to_string());
        }

        if !self.current_position_seconds.is_finite() || self.current_position_seconds < 0.0 {
            errors.push("Position must be a non-negative number of seconds".to_string());
        }

        if let Some(parts) = &self.parts {
            if parts.is_empty() {
                errors.push("Part list cannot be empty when present".to_string());
            } else if parts.len() > 1 {
                match self.current_part_index {
                    Some(index) if index < parts.len() => {
                        if parts[index].uri != self.uri {
                            errors.push("Uri must mirror the selected part".to_string());
                        }
                    }
                    _ => errors.push("Selected part index is out of range".to_string()),
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Partial update for an [`Audiobook`]; `None` fields are left untouched
///
/// `author` and `artwork_uri` are doubly optional so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudiobookPatch {
    pub title: Option<String>,
    pub author: Option<Option<String>>,
    pub artwork_uri: Option<Option<String>>,
    pub total_duration_seconds: Option<f64>,
    pub current_position_seconds: Option<f64>,
    pub current_part_index: Option<usize>,
    pub last_played_at: Option<Timestamp>,
    pub is_finished: Option<bool>,
}

impl AudiobookPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: Option<String>) -> Self {
        self.author = Some(author);
        self
    }

    pub fn artwork_uri(mut self, artwork: Option<String>) -> Self {
        self.artwork_uri = Some(artwork);
        self
    }

    pub fn position(mut self, seconds: f64) -> Self {
        self.current_position_seconds = Some(seconds);
        self
    }

    pub fn part_index(mut self, index: usize) -> Self {
        self.current_part_index = Some(index);
        self
    }

    pub fn last_played_at(mut self, at: Timestamp) -> Self {
        self.last_played_at = Some(at);
        self
    }

    pub fn finished(mut self, finished: bool) -> Self {
        self.is_finished = Some(finished);
        self
    }

    /// Returns true if applying this patch would change nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
