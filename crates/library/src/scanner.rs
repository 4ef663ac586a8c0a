// FILE: crates/library/src/scanner.rs

//! Directory scanning for import candidates

use crate::error::{LibraryError, LibraryResult};
use crate::ordering::SourceFile;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::Path;
use walkdir::WalkDir;

/// Supported audio file extensions
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "m4b", "flac", "ogg", "opus", "aac", "wma", "wav", "aiff", "ape", "wv",
];

/// Configuration for directory scans
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Maximum depth for recursive scanning (None = unlimited)
    pub max_depth: Option<usize>,
    /// Minimum file size in bytes (files smaller are ignored)
    pub min_file_size: u64,
    /// Follow symbolic links
    pub follow_symlinks: bool,
    /// Accepted file extensions, lowercase
    pub supported_extensions: HashSet<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(4),
            min_file_size: 0,
            follow_symlinks: false,
            supported_extensions: SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScannerConfig {
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_file_size(mut self, size: u64) -> Self {
        self.min_file_size = size;
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

/// Collects the audio files of one folder as import candidates
#[derive(Debug, Clone, Default)]
pub struct LibraryScanner {
    config: ScannerConfig,
}

impl LibraryScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Walks `dir` and returns every audio file in it, in no particular order
    pub fn scan(&self, dir: &Path) -> LibraryResult<Vec<SourceFile>> {
        if !dir.is_dir() {
            return Err(LibraryError::NotADirectory(dir.display().to_string()));
        }

        let walker = WalkDir::new(dir)
            .follow_links(self.config.follow_symlinks)
            .max_depth(self.config.max_depth.unwrap_or(usize::MAX));

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Error walking directory: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || !self.is_candidate(path) {
                continue;
            }

            match source_file(path) {
                Ok(file) => files.push(file),
                Err(e) => debug!("Skipping {}: {}", path.display(), e),
            }
        }

        info!("Found {} audio files in {}", files.len(), dir.display());
        Ok(files)
    }

    fn is_candidate(&self, path: &Path) -> bool {
        let has_valid_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.config.supported_extensions.contains(&e.to_lowercase()))
            .unwrap_or(false);

        if !has_valid_extension {
            return false;
        }

        if self.config.min_file_size == 0 {
            return true;
        }

        std::fs::metadata(path)
            .map(|m| m.len() >= self.config.min_file_size)
            .unwrap_or(false)
    }
}

/// Describes one file on disk as an import candidate, with a `file://` uri
pub fn source_file(path: &Path) -> LibraryResult<SourceFile> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LibraryError::InvalidFile(path.display().to_string()))?;
    let absolute = path.canonicalize()?;
    Ok(SourceFile::new(name, format!("file://{}", absolute.display())))
}
