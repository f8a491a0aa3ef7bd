//! Reconnecting controller link

use crate::transport::traits::{ByteLink, TransportConnector, TransportStream};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Wraps a connector; the stream is opened on first use and re-opened on
/// the next call after it fails
pub struct Link<C: TransportConnector> {
    connector: C,
    stream: Option<C::Stream>,
}

impl<C: TransportConnector> Link<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            stream: None,
        }
    }

    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    async fn stream(&mut self) -> Result<&mut C::Stream> {
        if self.stream.is_none() {
            let stream = self.connector.connect().await?;
            info!("[{}] Link open", self.connector.name());
            self.stream = Some(stream);
        }
        match self.stream.as_mut() {
            Some(stream) => Ok(stream),
            None => bail!("{} link unavailable", self.connector.name()),
        }
    }
}

#[async_trait]
impl<C: TransportConnector> ByteLink for Link<C> {
    async fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let stream = self.stream().await?;
        match tokio::time::timeout(timeout, stream.read(buf)).await {
            Err(_) => Ok(0),
            Ok(Ok(0)) => {
                self.stream = None;
                bail!("{} link closed", self.connector.name())
            }
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) => {
                warn!("[{}] Read failed: {}", self.connector.name(), e);
                self.stream = None;
                Err(e.into())
            }
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        let stream = self.stream().await?;
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');

        let result = async {
            stream.write_all(&bytes).await?;
            stream.flush().await
        }
        .await;

        if let Err(e) = result {
            warn!("[{}] Write failed: {}", self.connector.name(), e);
            self.stream = None;
            return Err(e.into());
        }
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = TransportStream::shutdown(&mut stream).await {
                debug!("[{}] Shutdown failed: {}", self.connector.name(), e);
            }
        }
    }
}
