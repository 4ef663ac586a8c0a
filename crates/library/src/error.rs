// FILE: crates/library/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Nothing to import: no audio files given")]
    NoFiles,

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Invalid audiobook: {}", .0.join("; "))]
    InvalidAudiobook(Vec<String>),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LibraryResult<T> = std::result::Result<T, LibraryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_audiobook_lists_problems() {
        let err = LibraryError::InvalidAudiobook(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "Invalid audiobook: a; b");
    }
}
