//! Newline framing for the controller byte stream
//!
//! The controller writes text lines of the form:
//! ```text
//! AT+SEND=1,2\r\n
//! ```
//!
//! Reads arrive in arbitrary chunks, so bytes are accumulated until a
//! linefeed completes a line. A carriage return is tolerated anywhere in
//! the line and surrounding whitespace is trimmed.

use bytes::{Buf, BytesMut};
use thiserror::Error;

use crate::limits::MAX_LINE_LEN;

/// Errors that can occur while framing lines
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("line exceeds {MAX_LINE_LEN} bytes")]
    LineTooLong,
}

/// Streaming line decoder
///
/// Feed raw reads with [`LineFramer::extend`] and drain complete lines with
/// [`LineFramer::decode_next`]. An oversized line yields one
/// [`FrameError::LineTooLong`] and framing continues with the next line.
#[derive(Debug, Default)]
pub struct LineFramer {
    /// Bytes of lines not yet terminated
    buffer: BytesMut,
    /// Bytes already shed from an oversized line still awaiting its linefeed
    discarded: usize,
}

impl LineFramer {
    /// Create a new line framer
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(MAX_LINE_LEN * 2),
            discarded: 0,
        }
    }

    /// Add a chunk read from the stream
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        // An unterminated tail longer than a line plus its CR is already
        // rejected; keep only its length
        if self.buffer.len() > MAX_LINE_LEN + 1 && !self.buffer.contains(&b'\n') {
            self.discarded += self.buffer.len();
            self.buffer.clear();
        }
    }

    /// Try to decode the next complete line from the buffer
    ///
    /// Returns:
    /// - `Ok(Some(line))` for a trimmed, non-empty line
    /// - `Ok(None)` if more data is needed
    /// - `Err(FrameError::LineTooLong)` for a rejected line; call again to
    ///   continue with the lines after it
    pub fn decode_next(&mut self) -> Result<Option<String>, FrameError> {
        loop {
            let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') else {
                return Ok(None);
            };

            let mut raw = self.buffer.split_to(pos);
            self.buffer.advance(1);

            if raw.last() == Some(&b'\r') {
                raw.truncate(raw.len() - 1);
            }

            let raw_len = raw.len() + std::mem::take(&mut self.discarded);
            if raw_len > MAX_LINE_LEN {
                return Err(FrameError::LineTooLong);
            }

            let text = String::from_utf8_lossy(&raw).replace('\r', "");
            let line = text.trim();
            if line.is_empty() {
                continue;
            }

            return Ok(Some(line.to_string()));
        }
    }

    /// Decode every complete line currently buffered
    pub fn drain(&mut self) -> Vec<Result<String, FrameError>> {
        let mut lines = Vec::new();
        loop {
            match self.decode_next() {
                Ok(Some(line)) => lines.push(Ok(line)),
                Ok(None) => break,
                Err(e) => lines.push(Err(e)),
            }
        }
        lines
    }

    /// Get the current buffer length (for debugging)
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}
