use bytes::Bytes;

use crate::encoding::decode_cp1252;
use crate::error::{FrameError, Result};

/// The engine's answer to one request.
///
/// Built by transports, never mutated afterwards. What a response can tell
/// you depends on where it came from: shared-memory engines declare a length
/// and an error flag, socket engines only stream bytes until they hang up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    data: Bytes,
    declared_length: Option<usize>,
    error: Option<bool>,
    null_terminated: bool,
}

impl Response {
    /// A response with data only: no declared length, unknown error state.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            declared_length: None,
            error: None,
            null_terminated: false,
        }
    }

    /// A response with every field supplied.
    ///
    /// Fails if `null_terminated` is set on non-empty data whose last byte
    /// is not zero.
    pub fn from_parts(
        data: impl Into<Bytes>,
        declared_length: Option<usize>,
        error: Option<bool>,
        null_terminated: bool,
    ) -> Result<Self> {
        let data = data.into();
        if null_terminated {
            if let Some(&last) = data.last() {
                if last != 0 {
                    return Err(FrameError::NotNullTerminated { last });
                }
            }
        }
        Ok(Self {
            data,
            declared_length,
            error,
            null_terminated,
        })
    }

    /// Raw response bytes exactly as the engine produced them.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Owned handle to the raw bytes.
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// How long the engine said the response is, if it said.
    pub fn declared_length(&self) -> Option<usize> {
        self.declared_length
    }

    /// The engine's error flag: `None` when the transport cannot report one.
    pub fn error(&self) -> Option<bool> {
        self.error
    }

    pub fn null_terminated(&self) -> bool {
        self.null_terminated
    }

    /// The bytes that count as text: cut to the declared length, minus the
    /// terminator when there is one.
    pub fn text_bytes(&self) -> &[u8] {
        let mut cutoff = self
            .declared_length
            .map_or(self.data.len(), |declared| declared.min(self.data.len()));
        if self.null_terminated {
            cutoff = cutoff.saturating_sub(1);
        }
        &self.data[..cutoff]
    }

    /// Decode the response as cp1252 text.
    ///
    /// Does not check whether the response is meant to be text; binary
    /// output decodes to whatever characters its bytes map to.
    pub fn text(&self) -> String {
        decode_cp1252(self.text_bytes())
    }
}
