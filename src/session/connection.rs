//! Framed connection: bytes in, complete packet texts out; reply lines out.

use crate::error::TransportError;
use crate::protocol::FrameDecoder;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const READ_CHUNK: usize = 8192;

pub struct FramedConnection<S> {
    stream: S,
    decoder: FrameDecoder,
    pending: VecDeque<String>,
    read_timeout: Duration,
}

impl<S: AsyncRead + AsyncWrite + Unpin> FramedConnection<S> {
    pub fn new(stream: S, max_frame_bytes: usize, read_timeout: Duration) -> Self {
        Self {
            stream,
            decoder: FrameDecoder::new(max_frame_bytes),
            pending: VecDeque::new(),
            read_timeout,
        }
    }

    /// Frames already decoded but not yet handed out.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Next complete message text. `None` on a clean close between messages.
    pub async fn next_frame(&mut self) -> anyhow::Result<Option<String>> {
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(frame));
            }

            let n = tokio::time::timeout(self.read_timeout, self.stream.read(&mut chunk))
                .await
                .map_err(|_| TransportError::ReadTimeout {
                    secs: self.read_timeout.as_secs(),
                })??;
            if n == 0 {
                if self.decoder.is_empty() {
                    return Ok(None);
                }
                tracing::warn!(
                    buffered = self.decoder.remainder().len(),
                    "Connection closed mid-message"
                );
                return Err(TransportError::Closed.into());
            }

            self.decoder.push(&chunk[..n])?;
            let frames = self.decoder.drain();
            if frames.is_empty() {
                tracing::debug!(
                    buffered = self.decoder.remainder().len(),
                    "Waiting for the rest of a message"
                );
            }
            self.pending.extend(frames);
        }
    }

    /// Write one reply line.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        let data = format!("{line}\n");
        self.stream
            .write_all(data.as_bytes())
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        self.stream
            .flush()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        Ok(())
    }
}
