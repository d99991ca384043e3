//! Single-byte text codecs used on the engine wire.
//!
//! Requests go out as Latin-1, which maps every byte value 0-255 to the code
//! point of the same value. Responses come back in the engine's Windows code
//! page (cp1252), whose 0x80-0x9F block differs from Latin-1.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// cp1252 code points for bytes 0x80..=0x9F. Undefined slots decode to U+FFFD.
const CP1252_HIGH_CONTROL: [char; 32] = [
    '\u{20AC}', '\u{FFFD}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{FFFD}', '\u{017D}', '\u{FFFD}',
    '\u{FFFD}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{FFFD}', '\u{017E}', '\u{0178}',
];

/// A request body as handed to the interface: either text or raw bytes.
///
/// Coerced to bytes exactly once, at the API boundary, by [`CaosInput::to_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaosInput<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl<'a> From<&'a str> for CaosInput<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for CaosInput<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text.as_str())
    }
}

impl<'a> From<&'a [u8]> for CaosInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for CaosInput<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Self::Bytes(bytes.as_slice())
    }
}

impl<'a> From<&'a Vec<u8>> for CaosInput<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::Bytes(bytes.as_slice())
    }
}

impl CaosInput<'_> {
    /// Coerce the input into wire bytes. Text is encoded as Latin-1.
    pub fn to_bytes(self) -> Result<Bytes> {
        match self {
            Self::Text(text) => encode_latin1(text),
            Self::Bytes(bytes) => Ok(Bytes::copy_from_slice(bytes)),
        }
    }

    /// Length in bytes once coerced, for text assuming it encodes cleanly.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Bytes(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Encode text as Latin-1, failing on the first character above U+00FF.
pub fn encode_latin1(text: &str) -> Result<Bytes> {
    let mut dst = BytesMut::with_capacity(text.len());
    for (position, character) in text.chars().enumerate() {
        let code = u32::from(character);
        if code > 0xFF {
            return Err(FrameError::Unencodable {
                character,
                position,
            });
        }
        dst.put_u8(code as u8);
    }
    Ok(dst.freeze())
}

/// Decode bytes with the Windows-1252 code page.
///
/// Never fails: bytes with no cp1252 assignment become U+FFFD.
pub fn decode_cp1252(data: &[u8]) -> String {
    data.iter()
        .map(|&byte| match byte {
            0x80..=0x9F => CP1252_HIGH_CONTROL[usize::from(byte - 0x80)],
            _ => char::from(byte),
        })
        .collect()
}
