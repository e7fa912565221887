//! Incremental SSE frame parsing
//!
//! Bytes arrive in arbitrary chunks; the parser buffers them, splits on
//! newlines, and decodes `data:` lines as JSON notification payloads.
//! Malformed payloads are logged and skipped; a bad frame never terminates
//! the connection.

use tracing::warn;

use crate::notifications::event::NotificationPayload;

/// SSE line prefix carrying event payloads
const DATA_PREFIX: &str = "data:";

/// Buffering line parser for one SSE connection
#[derive(Debug, Default)]
pub struct FrameParser {
    buffer: Vec<u8>,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of stream bytes; returns payloads decoded from any
    /// lines completed by this chunk
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<NotificationPayload> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            // Blank frame separators and comment keep-alives.
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            if let Some(data) = line.strip_prefix(DATA_PREFIX) {
                let data = data.strip_prefix(' ').unwrap_or(data);
                match serde_json::from_str::<NotificationPayload>(data) {
                    Ok(payload) => payloads.push(payload),
                    Err(err) => {
                        warn!("skipping malformed notification frame: {}", err);
                    }
                }
            }
            // Other SSE fields (event:, id:, retry:) are not used by the
            // notification feed.
        }
        payloads
    }

    /// Bytes of the unterminated trailing line, if any
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}
