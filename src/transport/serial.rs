//! Serial transport: the UART wired to the controller

use crate::transport::traits::{TransportConnector, TransportStream};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Default UART speed
pub const DEFAULT_BAUD: u32 = 115_200;

/// Serial port wrapper implementing TransportStream
pub struct SerialTransportStream {
    inner: SerialStream,
}

impl AsyncRead for SerialTransportStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for SerialTransportStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

#[async_trait]
impl TransportStream for SerialTransportStream {
    async fn shutdown(&mut self) -> Result<()> {
        // A UART has no close handshake; drain what is queued
        self.inner.flush().await?;
        Ok(())
    }
}

/// Opens a serial device such as `/dev/ttyUSB0`
#[derive(Debug, Clone)]
pub struct SerialConnector {
    path: String,
    baud: u32,
}

impl SerialConnector {
    pub fn new(path: impl Into<String>, baud: u32) -> Self {
        Self {
            path: path.into(),
            baud,
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[cfg(test)]
    pub fn baud(&self) -> u32 {
        self.baud
    }
}

#[async_trait]
impl TransportConnector for SerialConnector {
    type Stream = SerialTransportStream;

    async fn connect(&self) -> Result<Self::Stream> {
        let inner = tokio_serial::new(&self.path, self.baud)
            .open_native_async()
            .with_context(|| format!("opening {} at {} baud", self.path, self.baud))?;
        Ok(SerialTransportStream { inner })
    }

    fn name(&self) -> &'static str {
        "Serial"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_connector_settings() {
        let connector = SerialConnector::new("/dev/ttyUSB0", DEFAULT_BAUD);
        assert_eq!(connector.name(), "Serial");
        assert_eq!(connector.path(), "/dev/ttyUSB0");
        assert_eq!(connector.baud(), 115_200);
    }

    #[tokio::test]
    async fn test_missing_device_fails_to_open() {
        let connector = SerialConnector::new("/dev/aio-modem-missing", DEFAULT_BAUD);
        assert!(connector.connect().await.is_err());
    }
}
