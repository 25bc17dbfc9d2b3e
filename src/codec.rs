//! Session text codecs
//!
//! The scanner consumes Unicode code points, not bytes. Raw PTY output is
//! turned into code points by the active codec: either streaming UTF-8 or the
//! byte-transparent locale codec, switched at runtime by `ESC % G` and
//! `ESC % @`. Keyboard text headed the other way is encoded through the same
//! selection.

/// The two codec sentinels a session can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    #[default]
    Locale,
    Utf8,
}

impl Codec {
    /// Encode outbound key text under this codec.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            // Both selections ship UTF-8 on the outbound leg; the locale
            // codec differs only in how incoming bytes become code points.
            Codec::Utf8 | Codec::Locale => text.as_bytes().to_vec(),
        }
    }
}

/// Incremental UTF-8 decoder for byte streams cut at arbitrary points.
///
/// Bytes are collected until [`std::str::from_utf8`] either accepts the
/// prefix or rules it out for good. `feed` returns the finished code point,
/// `None` while a multi-byte sequence is still open, and `U+FFFD` for each
/// rejected sequence.
#[derive(Debug, Clone, Default)]
pub struct Utf8Decoder {
    pending: [u8; 4],
    filled: usize,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a half-read sequence, e.g. when the codec is switched.
    pub fn reset(&mut self) {
        self.filled = 0;
    }

    /// A multi-byte sequence is waiting for its continuation bytes.
    pub fn is_pending(&self) -> bool {
        self.filled > 0
    }

    pub fn feed(&mut self, byte: u8) -> Option<char> {
        if self.filled == 0 && byte.is_ascii() {
            return Some(char::from(byte));
        }

        self.pending[self.filled] = byte;
        self.filled += 1;

        match std::str::from_utf8(&self.pending[..self.filled]) {
            Ok(decoded) => {
                self.filled = 0;
                decoded.chars().next()
            }
            // a well-formed prefix that merely ends early keeps collecting;
            // four bytes always decide one way or the other
            Err(error) if error.error_len().is_none() && self.filled < 4 => None,
            Err(_) => {
                self.filled = 0;
                Some(char::REPLACEMENT_CHARACTER)
            }
        }
    }
}
