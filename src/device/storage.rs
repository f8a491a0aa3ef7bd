//! Directory-backed record storage

use super::traits::Storage;
use crate::error::StorageError;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Stores each record as a file under one directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        tokio::fs::read(self.path(name))
            .await
            .map_err(|source| StorageError::Read {
                name: name.to_string(),
                source,
            })
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let write_err = |source: std::io::Error| StorageError::Write {
            name: name.to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(write_err)?;

        // Staged write, then an atomic rename over the old record
        let target = self.path(name);
        let staging = self.path(&format!("{name}.tmp"));
        tokio::fs::write(&staging, bytes).await.map_err(write_err)?;
        tokio::fs::rename(&staging, &target)
            .await
            .map_err(write_err)?;

        debug!("[STORAGE] Wrote {} ({} bytes)", target.display(), bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("aio-modem-{}-{}", tag, std::process::id()))
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = scratch_dir("rw");
        let storage = FileStorage::new(&dir);

        storage.write("record.json", b"{\"a\":1}").await.unwrap();
        assert_eq!(storage.read("record.json").await.unwrap(), b"{\"a\":1}");

        storage.write("record.json", b"{}").await.unwrap();
        assert_eq!(storage.read("record.json").await.unwrap(), b"{}");

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_missing_record_is_read_error() {
        let storage = FileStorage::new(scratch_dir("missing"));
        let err = storage.read("nothing.json").await.unwrap_err();
        assert!(matches!(err, StorageError::Read { .. }));
        assert!(err.to_string().starts_with("read nothing.json"));
    }
}
