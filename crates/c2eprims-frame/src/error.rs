/// Errors that can occur while framing requests or building responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The request text holds a character the single-byte wire encoding cannot carry.
    #[error("character {character:?} at position {position} is outside the Latin-1 range")]
    Unencodable { character: char, position: usize },

    /// A response was declared null-terminated but its last byte is not zero.
    #[error("response data is not null-terminated (last byte 0x{last:02x})")]
    NotNullTerminated { last: u8 },
}

pub type Result<T> = std::result::Result<T, FrameError>;
