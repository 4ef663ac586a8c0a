//! Opening the SQLite file behind [`crate::SqliteKvStore`]

use earmark_core::AppError;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub type DbPool = SqlitePool;

/// How the library database file is opened
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    /// Write-ahead logging lets snapshot reads proceed while progress is saved
    pub enable_wal: bool,
    /// How long a write waits for another process holding the file lock
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: 4,
            enable_wal: true,
            busy_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_wal(mut self, enable: bool) -> Self {
        self.enable_wal = enable;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}

/// Opens (creating if needed) the library database
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, AppError> {
    let journal = if config.enable_wal {
        SqliteJournalMode::Wal
    } else {
        SqliteJournalMode::Delete
    };
    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true)
        .journal_mode(journal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(config.busy_timeout);

    let operation = format!("open {}", config.path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .connect_with(options)
        .await
        .map_err(|e| classify(&operation, e))?;

    log::debug!(
        "Opened library database {} ({:?} journal)",
        config.path.display(),
        journal
    );
    Ok(pool)
}

/// Opens a private in-memory database
pub async fn connect_in_memory() -> Result<DbPool, AppError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| AppError::database("Bad in-memory database url", e))?;

    // Every connection to `:memory:` gets its own empty database
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| classify("open in-memory database", e))
}

/// Maps a sqlx failure, reporting lock contention as [`AppError::DatabaseLocked`]
pub(crate) fn classify(operation: &str, err: sqlx::Error) -> AppError {
    if is_lock_contention(&err) {
        log::warn!("Library database busy during {}", operation);
        return AppError::DatabaseLocked {
            operation: operation.to_string(),
        };
    }
    AppError::database(format!("Failed to {}", operation), err)
}

fn is_lock_contention(err: &sqlx::Error) -> bool {
    const SQLITE_BUSY: i32 = 5;
    const SQLITE_LOCKED: i32 = 6;

    let sqlx::Error::Database(db) = err else {
        return false;
    };
    // Extended result codes keep the primary code in the low byte
    db.code()
        .and_then(|code| code.parse::<i32>().ok())
        .map_or(false, |code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}
