// FILE: crates/library/src/ordering.rs

//! Filename-based part ordering and title detection
//!
//! Everything here is a pure function of the input set: the same files in any
//! order produce the same parts and the same title.

use earmark_core::AudiobookPart;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Title used when no common name can be derived
pub const UNTITLED: &str = "Untitled Audiobook";

/// Part-number patterns, highest priority first
static PART_NUMBER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:^|[^a-z])part\s*[-_.#:]?\s*(\d+)",
        r"(?i)(?:^|[^a-z])chapter\s*[-_.#:]?\s*(\d+)",
        r"(?i)(?:^|[^a-z])track\s*[-_.#:]?\s*(\d+)",
        r"(?i)(\d+)\s*of\s*\d+",
        r"^\s*(\d+)",
        r"(\d+)\s*$",
        r"(\d{2,})",
        r"(\d+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("part number regex should compile"))
    .collect()
});

static TRAILING_PART_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:part|chapter|track)\s*\d*$").expect("part token regex should compile")
});

const TITLE_SEPARATORS: &[char] = &[' ', '-', '_', '.', ',', ':', '(', '[', '#'];

/// One file handed over by the import pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Display filename, extension included
    pub name: String,
    pub uri: String,
    /// Duration if the import pipeline already knows it
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            duration_seconds: None,
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}

/// Result of ordering a file set
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedParts {
    pub title: String,
    pub parts: Vec<AudiobookPart>,
}

/// Orders `files` into parts and detects a title
pub fn order_files(files: &[SourceFile]) -> OrderedParts {
    let mut keyed: Vec<(Option<u32>, &SourceFile)> = files
        .iter()
        .map(|file| (extract_part_number(&file.name), file))
        .collect();

    keyed.sort_by(|(a_num, a), (b_num, b)| compare_keys(*a_num, a, *b_num, b));

    let stems: Vec<&str> = keyed.iter().map(|(_, f)| strip_extension(&f.name)).collect();
    let title = detect_title(&stems);

    let parts = keyed
        .into_iter()
        .map(|(number, file)| {
            let mut part = AudiobookPart::new(file.uri.clone(), file.name.clone());
            part.part_number = number;
            part.duration_seconds = file.duration_seconds;
            part
        })
        .collect();

    OrderedParts { title, parts }
}

fn compare_keys(a_num: Option<u32>, a: &SourceFile, b_num: Option<u32>, b: &SourceFile) -> Ordering {
    let by_number = match (a_num, b_num) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_number
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.uri.cmp(&b.uri))
}

/// Extracts the part number from a filename, ignoring its extension
pub fn extract_part_number(name: &str) -> Option<u32> {
    let stem = strip_extension(name);

    PART_NUMBER_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(stem)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    })
}

/// Removes a short trailing extension such as `.mp3` or `.m4b`
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            stem
        }
        _ => name,
    }
}

/// Derives a title from extension-stripped names, already in sorted order
pub fn detect_title(stems: &[&str]) -> String {
    let title = match stems {
        [] => String::new(),
        [single] => single.trim().to_string(),
        [first, rest @ ..] => {
            let prefix = common_prefix_ignore_case(first, rest);
            clean_title(prefix)
        }
    };

    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

/// Longest case-insensitive common prefix, in the casing of `first`
fn common_prefix_ignore_case<'a>(first: &'a str, rest: &[&str]) -> &'a str {
    let mut end = first.len();

    for other in rest {
        let mut matched = 0;
        let mut other_chars = other.chars();
        for (index, c) in first.char_indices() {
            if index >= end {
                break;
            }
            match other_chars.next() {
                Some(o) if o.to_lowercase().eq(c.to_lowercase()) => {
                    matched = index + c.len_utf8();
                }
                _ => break,
            }
        }
        end = end.min(matched);
    }

    &first[..end]
}

fn clean_title(prefix: &str) -> String {
    let mut title = prefix;

    loop {
        let before = title;
        title = title.trim_end_matches(TITLE_SEPARATORS);

        if let Some(m) = TRAILING_PART_TOKEN.find(title) {
            let bare = title[..m.start()]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
            if bare {
                title = &title[..m.start()];
            }
        }

        if title == before {
            break;
        }
    }

    title.trim().to_string()
}
