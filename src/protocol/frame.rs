//! Frame decoder for the host's stream of concatenated JSON objects.
//!
//! The host writes packets back to back (`{...}{...}` or `{...}\n{...}`)
//! without a length prefix, and a single socket read may hold a fragment of
//! one packet or several packets at once. Bytes are buffered until the whole
//! buffer is brace-balanced, then split at object boundaries.
//!
//! Brace counting is purely lexical: a `{` or `}` inside a quoted string is
//! counted like a structural one, and a `}{` pair inside talk text is taken as
//! a boundary. Such frames are misclassified; this is a known limitation.

use crate::error::ProtocolError;

/// Default upper bound for buffered bytes without a complete frame.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Whether the text is a complete message: non-empty and brace-balanced.
pub fn is_complete_text(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    let mut depth: i64 = 0;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
    }
    depth == 0
}

/// Byte-level completeness check. Bytes that are not valid UTF-8 count as
/// incomplete; a multibyte character split across reads lands here.
pub fn is_complete(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(text) => is_complete_text(text),
        Err(_) => false,
    }
}

/// Re-attach the braces lost when a chunk is split at a boundary.
pub fn normalize_fragment(fragment: &str) -> String {
    let trimmed = fragment.trim_end();
    let mut out = String::with_capacity(trimmed.len() + 2);
    if !trimmed.starts_with('{') {
        out.push('{');
    }
    out.push_str(trimmed);
    if !trimmed.ends_with('}') {
        out.push('}');
    }
    out
}

/// Split a chunk at every `}` followed (after optional whitespace) by `{`.
///
/// Each piece is normalized with [`normalize_fragment`]. Whitespace-only
/// chunks yield nothing.
pub fn split_frames(chunk: &str) -> Vec<String> {
    if chunk.trim().is_empty() {
        return Vec::new();
    }

    let mut frames = Vec::new();
    let mut start = 0;
    let bytes = chunk.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'}' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'{' {
                frames.push(&chunk[start..i]);
                start = j + 1;
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }
    frames.push(&chunk[start..]);

    frames
        .into_iter()
        .map(|fragment| normalize_fragment(fragment.trim_start()))
        .collect()
}

/// Accumulates raw socket bytes and yields complete message texts.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    max_bytes: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl FrameDecoder {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_bytes: max_bytes.max(1),
        }
    }

    /// Feed bytes read from the socket.
    pub fn push(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.buf.extend_from_slice(bytes);
        if self.buf.len() > self.max_bytes && !is_complete(&self.buf) {
            return Err(ProtocolError::FrameTooLarge {
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Drain every complete message. Returns an empty vec and keeps the bytes
    /// buffered while the buffer is still incomplete.
    pub fn drain(&mut self) -> Vec<String> {
        if !is_complete(&self.buf) {
            return Vec::new();
        }
        let bytes = std::mem::take(&mut self.buf);
        // is_complete already proved the buffer is valid UTF-8.
        let text = String::from_utf8_lossy(&bytes);
        split_frames(&text)
    }

    /// Bytes still waiting for the rest of their message.
    pub(crate) fn remainder(&self) -> &[u8] {
        &self.buf
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
