//! Hardware identity and the broker client id derived from it

use super::traits::HardwareId;
use anyhow::{Context, Result};
use std::path::Path;

/// Identity bytes fixed at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticId(Vec<u8>);

impl StaticId {
    #[cfg(test)]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse an explicit hex override such as `a4cf12f00b1c`
    pub fn from_hex(text: &str) -> Result<Self> {
        let bytes = hex::decode(text.trim()).context("hardware id must be hex")?;
        Ok(Self(bytes))
    }

    /// Read the host's machine id (a hex string) from `path`
    pub fn from_machine_id(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_hex(&text)
    }
}

impl HardwareId for StaticId {
    fn id_bytes(&self) -> Vec<u8> {
        self.0.clone()
    }
}

/// Broker client id: `modem-<hex of hardware id>`
pub fn client_id(id: &dyn HardwareId) -> String {
    format!("modem-{}", hex::encode(id.id_bytes()))
}
