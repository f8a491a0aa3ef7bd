//! Transport traits for the controller link

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// A transport stream that can read and write bytes
#[async_trait]
pub trait TransportStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {
    /// Close the transport gracefully
    async fn shutdown(&mut self) -> Result<()>;
}

/// Factory for opening the controller stream
#[async_trait]
pub trait TransportConnector: Send + Sync {
    /// The stream type this connector produces
    type Stream: TransportStream;

    /// Attempt to open the stream
    async fn connect(&self) -> Result<Self::Stream>;

    /// Human-readable name for this transport
    fn name(&self) -> &'static str;
}

/// Chunked reader and line writer the engine runs on
#[async_trait]
pub trait ByteLink: Send {
    /// Read whatever arrives within `timeout`; `Ok(0)` means nothing arrived
    async fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Write one line followed by `\n`
    async fn write_line(&mut self, line: &str) -> Result<()>;

    /// Release the underlying stream
    async fn close(&mut self);
}
