//! Byte layout of the engine's shared memory buffer.
//!
//! ```text
//! ┌────────────┬────────────┬────────────┬────────────┬──────────┬──────────────────┐
//! │ Magic (4B) │ PID (4B LE)│ Status     │ Result len │ Reserved │ Request / result │
//! │ "c2e@"     │            │ (4B LE)    │ (4B LE)    │ (8B)     │ bytes            │
//! └────────────┴────────────┴────────────┴────────────┴──────────┴──────────────────┘
//!   0            4            8            12           16         24
//! ```

use bytes::Bytes;

use crate::error::{Result, TransportError};

/// Header every compatible engine writes at offset 0.
pub const MAGIC: [u8; 4] = *b"c2e@";

pub const PROCESS_ID_OFFSET: usize = 4;
pub const STATUS_OFFSET: usize = 8;
pub const RESULT_LENGTH_OFFSET: usize = 12;
pub const DATA_OFFSET: usize = 24;

/// What the engine reported after handling a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultStatus {
    pub error: bool,
    pub result_length: usize,
}

fn read_u32_le(buf: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(word)
}

/// Fail with [`TransportError::BadBuffer`] unless the buffer starts with [`MAGIC`].
///
/// A buffer too short to hold the fixed header is reported the same way,
/// with whatever bytes it does have.
pub fn check_magic(buf: &[u8]) -> Result<()> {
    let mut found = [0u8; 4];
    let available = buf.len().min(found.len());
    found[..available].copy_from_slice(&buf[..available]);
    if buf.len() < DATA_OFFSET || found != MAGIC {
        return Err(TransportError::BadBuffer { found });
    }
    Ok(())
}

/// The engine's process id. Call after [`check_magic`].
pub fn process_id(buf: &[u8]) -> u32 {
    read_u32_le(buf, PROCESS_ID_OFFSET)
}

/// Largest request payload the buffer can hold, terminator excluded.
pub fn request_capacity(buf: &[u8]) -> usize {
    buf.len().saturating_sub(DATA_OFFSET + 1)
}

/// Write a request at [`DATA_OFFSET`] followed by a NUL terminator.
pub fn write_request(buf: &mut [u8], payload: &[u8]) -> Result<()> {
    let max = request_capacity(buf);
    if payload.len() > max {
        return Err(TransportError::RequestTooLarge {
            size: payload.len(),
            max,
        });
    }
    let end = DATA_OFFSET + payload.len();
    buf[DATA_OFFSET..end].copy_from_slice(payload);
    buf[end] = 0;
    Ok(())
}

/// The status flag and result length the engine wrote at [`STATUS_OFFSET`].
pub fn read_status(buf: &[u8]) -> ResultStatus {
    ResultStatus {
        error: read_u32_le(buf, STATUS_OFFSET) != 0,
        result_length: read_u32_le(buf, RESULT_LENGTH_OFFSET) as usize,
    }
}

/// Copy out exactly `result_length` bytes from [`DATA_OFFSET`].
pub fn read_result(buf: &[u8], result_length: usize) -> Result<Bytes> {
    let available = buf.len().saturating_sub(DATA_OFFSET);
    if result_length > available {
        return Err(TransportError::ResultOverflow {
            declared: result_length,
            available,
        });
    }
    Ok(Bytes::copy_from_slice(
        &buf[DATA_OFFSET..DATA_OFFSET + result_length],
    ))
}
