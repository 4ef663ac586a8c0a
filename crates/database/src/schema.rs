//! Persisted document layout
//!
//! Collections are stored as `{ "version": N, "items": [...] }`. The loader
//! also accepts the older bare-array form, and skips individual items that
//! no longer decode instead of discarding the whole collection.

use earmark_core::AppError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage key for the audiobook collection
pub const AUDIOBOOKS_KEY: &str = "earmark.audiobooks";
/// Storage key for the note collection
pub const NOTES_KEY: &str = "earmark.notes";
/// Storage key for the settings document
pub const SETTINGS_KEY: &str = "earmark.settings";

/// Version written into every collection envelope
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    items: &'a [T],
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    items: Vec<Value>,
}

/// Encodes a collection into its versioned envelope
pub fn encode_collection<T: Serialize>(items: &[T]) -> Result<String, AppError> {
    serde_json::to_string(&EnvelopeRef {
        version: SCHEMA_VERSION,
        items,
    })
    .map_err(|e| AppError::serialization("Failed to encode collection", e))
}

/// Decodes a stored collection, tolerating legacy layout and bad items
///
/// Only a document that is not JSON at all, or has neither layout, is an
/// error.
pub fn decode_collection<T: DeserializeOwned>(key: &str, raw: &str) -> Result<Vec<T>, AppError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| AppError::CorruptedRecord {
        key: key.to_string(),
        reason: e.to_string(),
    })?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(_) => {
            let envelope: Envelope =
                serde_json::from_value(value).map_err(|e| AppError::CorruptedRecord {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
            if envelope.version > SCHEMA_VERSION {
                log::warn!(
                    "{} was written by a newer schema (v{} > v{}), reading what we can",
                    key,
                    envelope.version,
                    SCHEMA_VERSION
                );
            }
            envelope.items
        }
        other => {
            return Err(AppError::CorruptedRecord {
                key: key.to_string(),
                reason: format!("expected a collection, found {}", json_kind(&other)),
            })
        }
    };

    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                log::warn!("Skipping undecodable entry {} in {}: {}", index, key, e);
                None
            }
        })
        .collect();

    if decoded.len() < total {
        log::warn!("Loaded {}/{} entries from {}", decoded.len(), total, key);
    }

    Ok(decoded)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
