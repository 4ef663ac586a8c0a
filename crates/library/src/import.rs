// FILE: crates/library/src/import.rs

//! Turning a set of picked files into a library record

use crate::error::{LibraryError, LibraryResult};
use crate::ordering::{order_files, SourceFile};
use earmark_core::{Audiobook, Validator};
use earmark_database::LibraryStore;
use std::sync::Arc;

/// Book import options
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Overrides the detected title
    pub title: Option<String>,
    pub author: Option<String>,
    pub artwork_uri: Option<String>,
}

impl ImportOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_artwork(mut self, uri: impl Into<String>) -> Self {
        self.artwork_uri = Some(uri.into());
        self
    }
}

/// Builds an audiobook record from unordered files
///
/// One file yields a single-file book; several yield a multi-part book
/// positioned at its first part.
pub fn build_audiobook(files: &[SourceFile], options: ImportOptions) -> LibraryResult<Audiobook> {
    if files.is_empty() {
        return Err(LibraryError::NoFiles);
    }
    if let Some(bad) = files.iter().find(|f| f.uri.trim().is_empty()) {
        return Err(LibraryError::InvalidFile(format!("{} has no location", bad.name)));
    }

    let ordered = order_files(files);
    let title = options
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(ordered.title);

    let mut book = if ordered.parts.len() == 1 {
        let part = &ordered.parts[0];
        let mut book = Audiobook::new(title, part.uri.clone());
        book.total_duration_seconds = part.duration_seconds;
        book
    } else {
        Audiobook::from_parts(title, ordered.parts).ok_or(LibraryError::NoFiles)?
    };

    book.author = options.author.filter(|a| !a.trim().is_empty());
    book.artwork_uri = options.artwork_uri;

    book.validate().map_err(LibraryError::InvalidAudiobook)?;
    Ok(book)
}

/// Builds audiobooks and adds them to the library
pub struct BookImporter {
    store: Arc<LibraryStore>,
}

impl BookImporter {
    pub fn new(store: Arc<LibraryStore>) -> Self {
        Self { store }
    }

    /// Imports one audiobook made of `files`
    pub async fn import_files(
        &self,
        files: &[SourceFile],
        options: ImportOptions,
    ) -> LibraryResult<Audiobook> {
        let book = build_audiobook(files, options)?;
        log::info!(
            "Importing \"{}\" ({} part{})",
            book.title,
            book.part_count(),
            if book.is_multi_part() { "s" } else { "" }
        );
        self.store.add_audiobook(book.clone()).await;
        Ok(book)
    }
}
