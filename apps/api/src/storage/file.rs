//! Single-file backend: one JSON object mapping key -> string value.
//!
//! Writes land in a sibling temp file which is then renamed over the target,
//! so readers see either the old or the new document, never a torn one.
//! A document that does not parse reads as empty but is never written over.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{KvBackend, StorageError};

pub struct FileBackend {
    path: PathBuf,
    // serializes read-merge-write of the whole document
    lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&raw).map_err(|e| {
            StorageError::Corrupt(format!(
                "store file {} is not a JSON object ({e})",
                self.path.display()
            ))
        })
    }
}

#[async_trait]
impl KvBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        match self.load().await {
            Ok(mut map) => Ok(map.remove(key)),
            Err(StorageError::Corrupt(msg)) => {
                warn!("{msg}; reading '{key}' as absent");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        map.insert(key.to_string(), value.to_string());
        let document = serde_json::to_string_pretty(&map)?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, document.as_bytes()))
            .await
            .map_err(std::io::Error::other)??;

        debug!("Wrote key '{key}' to {}", self.path.display());
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "file"
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
