//! Settings document persistence

use crate::kv::KeyValueStore;
use crate::schema::SETTINGS_KEY;
use earmark_core::{AppError, Settings};

/// Loads stored settings, filling missing fields from defaults
pub async fn load_settings(kv: &dyn KeyValueStore) -> Result<Settings, AppError> {
    match kv.get(SETTINGS_KEY).await? {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| AppError::CorruptedRecord {
            key: SETTINGS_KEY.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(Settings::default()),
    }
}

/// Replaces the stored settings document
pub async fn store_settings(kv: &dyn KeyValueStore, settings: &Settings) -> Result<(), AppError> {
    let raw = serde_json::to_string(settings)
        .map_err(|e| AppError::serialization("Failed to encode settings", e))?;
    kv.set(SETTINGS_KEY, &raw).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let kv = MemoryKvStore::new();
        assert_eq!(load_settings(&kv).await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_partial_document_is_merged_over_defaults() {
        let kv = MemoryKvStore::new();
        kv.set(SETTINGS_KEY, r#"{"skip_forward_seconds":60}"#)
            .await
            .unwrap();

        let settings = load_settings(&kv).await.unwrap();
        assert_eq!(settings.skip_forward_seconds, 60);
        assert_eq!(settings.skip_backward_seconds, Settings::default().skip_backward_seconds);
    }
}
