//! Key-value persistence underneath the feedback store.
//!
//! Every backend speaks the same two-call contract (`get` / `set` of string
//! values). The store owns the encoding; backends only move strings around.

pub mod file;
pub mod memory;
pub mod redis_kv;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use redis_kv::RedisBackend;

pub const FEEDBACKS_KEY: &str = "village_feedbacks";
pub const USERS_KEY: &str = "village_users";
pub const CURRENT_USER_KEY: &str = "village_current_user";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Corrupt stored data: {0}")]
    Corrupt(String),

    #[error("Invalid storage configuration: {0}")]
    Config(String),
}

#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Short label for logs.
    fn kind(&self) -> &'static str;
}

/// Opens the backend named by `url`: `memory`, `file://<path>` or `redis://...`.
pub async fn open_backend(url: &str, key_prefix: &str) -> Result<Arc<dyn KvBackend>, StorageError> {
    let backend: Arc<dyn KvBackend> = if url == "memory" {
        Arc::new(MemoryBackend::new())
    } else if let Some(path) = url.strip_prefix("file://") {
        if path.is_empty() {
            return Err(StorageError::Config("file:// URL needs a path".to_string()));
        }
        Arc::new(FileBackend::new(path))
    } else if url.starts_with("redis://") || url.starts_with("rediss://") {
        Arc::new(RedisBackend::connect(url, key_prefix).await?)
    } else {
        return Err(StorageError::Config(format!(
            "unsupported STORAGE_URL '{url}' (expected memory, file://<path> or redis://...)"
        )));
    };

    info!("Storage backend ready: {}", backend.kind());
    Ok(backend)
}
