//! Incremental UTF-8 Decoding
//!
//! The chat endpoint streams raw UTF-8 text with no framing, so a chunk
//! boundary can land in the middle of a multi-byte character. The decoder
//! buffers the incomplete tail of each chunk and prepends it to the next one;
//! it never drops bytes and never substitutes a replacement character.

use thiserror::Error;

/// Errors from incremental decoding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The byte stream contained a sequence that is not valid UTF-8
    #[error("response contained invalid UTF-8")]
    InvalidUtf8,
    /// The stream ended in the middle of a multi-byte character
    #[error("stream ended in the middle of a UTF-8 sequence")]
    Truncated,
}

/// Streaming UTF-8 decoder that tolerates chunk boundaries splitting
/// multi-byte sequences
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Undecoded tail carried over from the previous chunk (at most 3 bytes)
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create a fresh decoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, combined with any carried-over tail
    ///
    /// Returns the decoded text, which is empty when the combined bytes end
    /// mid-character and nothing is complete yet. Invalid byte sequences are
    /// an error, never silently repaired.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<String, DecodeError> {
        self.pending.extend_from_slice(bytes);

        match std::str::from_utf8(&self.pending) {
            Ok(_) => {
                let complete = std::mem::take(&mut self.pending);
                String::from_utf8(complete).map_err(|_| DecodeError::InvalidUtf8)
            }
            Err(e) if e.error_len().is_none() => {
                // Incomplete trailing sequence: emit the valid prefix, keep
                // the tail for the next chunk.
                let tail = self.pending.split_off(e.valid_up_to());
                let head = std::mem::replace(&mut self.pending, tail);
                String::from_utf8(head).map_err(|_| DecodeError::InvalidUtf8)
            }
            Err(_) => {
                self.pending.clear();
                Err(DecodeError::InvalidUtf8)
            }
        }
    }

    /// Whether a partial sequence is still buffered
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Finish decoding at end of stream
    ///
    /// A clean stream end with buffered bytes means the last character was
    /// truncated.
    pub fn finish(&mut self) -> Result<(), DecodeError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            self.pending.clear();
            Err(DecodeError::Truncated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ascii_passthrough() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.feed(b"hello").unwrap(), "hello");
        assert!(!decoder.has_pending());
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn test_two_byte_sequence_split() {
        // "é" is 0xC3 0xA9
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.feed(&[0x63, 0x61, 0x66, 0xC3]).unwrap(), "caf");
        assert!(decoder.has_pending());
        assert_eq!(decoder.feed(&[0xA9]).unwrap(), "é");
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn test_three_byte_sequence_split() {
        // "€" is 0xE2 0x82 0xAC, split after each byte
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.feed(&[0xE2]).unwrap(), "");
        assert_eq!(decoder.feed(&[0x82]).unwrap(), "");
        assert_eq!(decoder.feed(&[0xAC]).unwrap(), "€");
    }

    #[test]
    fn test_four_byte_sequence_split() {
        // "😀" is 0xF0 0x9F 0x98 0x80, split down the middle
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.feed(&[0xF0, 0x9F]).unwrap(), "");
        assert_eq!(decoder.feed(&[0x98, 0x80, b'!']).unwrap(), "😀!");
    }

    #[test]
    fn test_invalid_byte_is_error_not_replacement() {
        let mut decoder = Utf8Decoder::new();
        let result = decoder.feed(&[b'o', b'k', 0xFF, b'x']);
        assert_eq!(result, Err(DecodeError::InvalidUtf8));
    }

    #[test]
    fn test_truncated_stream_end() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.feed(&[0xE2, 0x82]).unwrap(), "");
        assert_eq!(decoder.finish(), Err(DecodeError::Truncated));
    }

    #[test]
    fn test_empty_chunk() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.feed(&[]).unwrap(), "");
        assert_eq!(decoder.feed("mixed: é€😀".as_bytes()).unwrap(), "mixed: é€😀");
    }
}
