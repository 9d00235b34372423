//! Incremental decoder for badge reader frames.
//!
//! The reader writes each credential as a run of text between a line feed
//! and a carriage return. Nothing else on the line is structured: there may
//! be a preamble before the LF, trailing noise after the CR, or no CR at all
//! if the badge was pulled away mid-read.
//!
//! # Frame Format
//!
//! ```text
//! <preamble>  LF   <code>   CR  <anything>
//!            0x0A  1+ chars 0x0D
//! ```
//!
//! The code is the run of characters between the LF and the CR. It must be
//! non-empty and contains neither delimiter. When the buffer holds several
//! LFs before the CR, the code starts after the last of them.
//!
//! # Usage
//!
//! ```
//! use latchkey_protocol::FrameDecoder;
//!
//! let mut decoder = FrameDecoder::new();
//!
//! let mut code = None;
//! for &byte in b"\n12345\r" {
//!     if let Some(found) = decoder.feed(byte) {
//!         code = Some(found);
//!         break;
//!     }
//! }
//!
//! assert_eq!(code.unwrap().as_str(), "12345");
//! ```

use bytes::{BufMut, BytesMut};
use tracing::debug;

use latchkey_core::CredentialCode;
use latchkey_core::constants::{FRAME_END, FRAME_START, MAX_FRAME_BUFFER};

/// Counters describing what a decoder has seen since it was created.
///
/// Counters survive [`FrameDecoder::reset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Total bytes passed to [`FrameDecoder::feed`].
    pub bytes_fed: u64,

    /// Times the buffer was discarded for exceeding its limit.
    pub overflows: u64,

    /// Codes produced.
    pub codes: u64,
}

/// Byte-at-a-time decoder turning a serial stream into credential codes.
///
/// The decoder owns a bounded buffer. Each [`feed`](Self::feed) appends one
/// byte and checks whether the buffer now holds a complete frame. A buffer
/// that grows past its limit without producing a code is discarded, so a
/// reader stuck sending noise can never grow memory.
///
/// The decoder never clears the buffer after a match. Callers start every
/// logical read with [`reset`](Self::reset), which also drops any bytes left
/// over from an abandoned read.
///
/// # Example
///
/// ```
/// use latchkey_protocol::FrameDecoder;
///
/// let mut decoder = FrameDecoder::new();
///
/// // Two frames in one burst: only the first one is reported
/// let code = decoder.feed_slice(b"\n12345\r\n67890\r").unwrap();
/// assert_eq!(code.as_str(), "12345");
///
/// decoder.reset();
/// assert!(decoder.is_empty());
/// ```
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: BytesMut,
    limit: usize,
    stats: DecoderStats,
}

impl FrameDecoder {
    /// Create a decoder with the standard 41-byte buffer limit.
    pub fn new() -> Self {
        Self::with_capacity_limit(MAX_FRAME_BUFFER)
    }

    /// Create a decoder with a custom buffer limit.
    ///
    /// A limit below 3 can never hold a frame (`LF`, one character, `CR`),
    /// so it is raised to 3.
    pub fn with_capacity_limit(limit: usize) -> Self {
        let limit = limit.max(3);
        Self {
            buffer: BytesMut::with_capacity(limit + 1),
            limit,
            stats: DecoderStats::default(),
        }
    }

    /// Discard all buffered bytes.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Append one byte and report the code if the buffer now holds a frame.
    ///
    /// Returns `None` while the frame is incomplete, when the buffer is not
    /// valid UTF-8, and when the byte overflowed the buffer (which empties
    /// it). After a code is returned the buffer is left as is; call
    /// [`reset`](Self::reset) before the next read.
    pub fn feed(&mut self, byte: u8) -> Option<CredentialCode> {
        self.stats.bytes_fed += 1;
        self.buffer.put_u8(byte);

        if self.buffer.len() > self.limit {
            self.stats.overflows += 1;
            debug!(limit = self.limit, "frame buffer overflow, discarding");
            self.reset();
            return None;
        }

        let code = self.find_code()?;
        self.stats.codes += 1;
        Some(code)
    }

    /// Feed bytes in order until the first code.
    ///
    /// Bytes after the one that completed the frame are not fed; they are
    /// abandoned along with the rest of the read.
    pub fn feed_slice(&mut self, bytes: &[u8]) -> Option<CredentialCode> {
        bytes.iter().find_map(|&byte| self.feed(byte))
    }

    /// Currently buffered bytes.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Maximum number of bytes the buffer may hold.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Counters since the decoder was created.
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    fn find_code(&self) -> Option<CredentialCode> {
        // A frame can only complete on its closing byte
        if self.buffer.last() != Some(&FRAME_END) {
            return None;
        }
        let text = std::str::from_utf8(&self.buffer).ok()?;
        extract_code(text)
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the leftmost `LF <code> CR` run in `text`.
fn extract_code(text: &str) -> Option<CredentialCode> {
    let start = FRAME_START as char;
    let end = FRAME_END as char;

    let mut rest = text;
    while let Some(open) = rest.find(start) {
        let after = &rest[open + 1..];
        let close = after.find([start, end])?;
        if close > 0 && after[close..].starts_with(end) {
            return CredentialCode::new(&after[..close]).ok();
        }
        rest = &after[close..];
    }
    None
}
