//! Board-level collaborator traits: storage, indicator and identity

use crate::error::StorageError;
use anyhow::Result;
use async_trait::async_trait;

/// Named-record persistent storage
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a whole record
    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Replace a whole record
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError>;
}

/// Binary status indicator (the board LED)
pub trait Indicator: Send {
    fn set(&mut self, on: bool) -> Result<()>;
}

/// Stable hardware identity used to derive the broker client id
pub trait HardwareId: Send + Sync {
    fn id_bytes(&self) -> Vec<u8>;
}
