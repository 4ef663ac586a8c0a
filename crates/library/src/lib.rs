//! Earmark Library Management
//!
//! Turns loose audio files into library records: directory scanning, the
//! filename ordering heuristic, and the import builder that hands finished
//! audiobooks to the store.

pub mod error;
pub mod import;
pub mod ordering;
pub mod scanner;

pub use error::{LibraryError, LibraryResult};
pub use import::{build_audiobook, BookImporter, ImportOptions};
pub use ordering::{
    detect_title, extract_part_number, order_files, OrderedParts, SourceFile, UNTITLED,
};
pub use scanner::{source_file, LibraryScanner, ScannerConfig};
