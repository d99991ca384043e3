use std::fmt;
use std::io;

use c2eprims_frame::{FrameError, Response};
use c2eprims_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(io_code(&err), format!("{context}: {err}"))
}

fn io_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::InvalidInput => USAGE,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    }
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match &err {
        TransportError::Timeout { .. } => TIMEOUT,
        TransportError::Connect { source, .. } if is_timeout(source) => TIMEOUT,
        TransportError::Connect { .. }
        | TransportError::Disconnect { .. }
        | TransportError::Wait { .. }
        | TransportError::Os { .. }
        | TransportError::PeerExited { .. } => TRANSPORT_ERROR,
        TransportError::BadBuffer { .. }
        | TransportError::RequestTooLarge { .. }
        | TransportError::ResultOverflow { .. } => DATA_INVALID,
        TransportError::Frame(err) => frame_code(err),
        TransportError::Unsupported(_) => USAGE,
        TransportError::Io(source) => io_code(source),
        TransportError::AlreadyConnected(_) | TransportError::NotConnected(_) => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

fn frame_code(err: &FrameError) -> i32 {
    match err {
        FrameError::Unencodable { .. } | FrameError::NotNullTerminated { .. } => DATA_INVALID,
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

/// Exit code for a response the engine delivered: failure when it flagged an error.
pub fn response_code(response: &Response) -> i32 {
    if response.error() == Some(true) {
        FAILURE
    } else {
        SUCCESS
    }
}
