//! Collection-level reads and writes, organized by entity
//!
//! These functions propagate every failure; [`crate::LibraryStore`] decides
//! which ones to swallow.

pub mod audiobooks;
pub mod notes;
pub mod settings;

pub use audiobooks::{load_audiobooks, store_audiobooks};
pub use notes::{load_notes, store_notes};
pub use settings::{load_settings, store_settings};
