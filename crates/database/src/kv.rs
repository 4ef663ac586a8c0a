//! Key-value persistence backends
//!
//! Every persisted collection lives under a single string key as one JSON
//! document. Backends only move strings; encoding is handled by
//! [`crate::schema`].

use crate::connection::{self, classify, DatabaseConfig, DbPool};
use crate::migrations::run_migrations;
use async_trait::async_trait;
use earmark_core::{AppError, Timestamp};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Durable string key-value store
///
/// Each call is atomic on its own; sequences of calls are not.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Stores `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// Removes `key`; removing an absent key is not an error
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// SQLite-backed store using the `kv_store` table
#[derive(Debug, Clone)]
pub struct SqliteKvStore {
    pool: DbPool,
}

impl SqliteKvStore {
    /// Wraps an existing pool; the caller is responsible for migrations
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Connects to the configured database file and runs migrations
    pub async fn open(config: DatabaseConfig) -> Result<Self, AppError> {
        let pool = connection::connect(&config).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Opens a migrated, private in-memory database
    pub async fn in_memory() -> Result<Self, AppError> {
        let pool = connection::connect_in_memory().await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Returns the underlying pool
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Closes the pool, waiting for in-flight queries
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(&format!("read {}", key), e))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Timestamp::now().as_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| classify(&format!("write {}", key), e))?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(&format!("remove {}", key), e))?;

        Ok(())
    }
}

/// Volatile store for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
