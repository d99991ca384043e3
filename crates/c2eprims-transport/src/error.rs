use std::time::Duration;

/// Errors that can occur talking to an engine.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Setting up a transport resource failed.
    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        source: std::io::Error,
    },

    /// Tearing down a transport resource failed. The connection is closed anyway.
    #[error("failed to disconnect from {target}: {source}")]
    Disconnect {
        target: String,
        source: std::io::Error,
    },

    /// `connect` was called on a connected interface.
    #[error("already connected to {0}")]
    AlreadyConnected(String),

    /// `disconnect` was called on a disconnected interface.
    #[error("not connected to {0}")]
    NotConnected(String),

    /// The shared memory region exists but was not written by a compatible engine.
    #[error("bad shared memory buffer: expected header \"c2e@\", found \"{}\"", .found.escape_ascii())]
    BadBuffer { found: [u8; 4] },

    /// Waiting on a synchronization object failed at the OS level.
    #[error("wait on {object} failed: {source}")]
    Wait {
        object: &'static str,
        source: std::io::Error,
    },

    /// Waiting on a synchronization object or a socket read ran out of time.
    #[error("timed out after {timeout:?} waiting on {object}")]
    Timeout {
        object: &'static str,
        timeout: Duration,
    },

    /// An OS call other than a wait failed mid-request.
    #[error("{operation} failed: {source}")]
    Os {
        operation: &'static str,
        source: std::io::Error,
    },

    /// The engine process ended before it answered.
    #[error("engine process {pid} exited before responding")]
    PeerExited { pid: u32 },

    /// The request does not fit in the shared memory buffer.
    #[error("request too large ({size} bytes, max {max})")]
    RequestTooLarge { size: usize, max: usize },

    /// The engine declared a result longer than the shared memory buffer.
    #[error("declared result length {declared} overruns buffer ({available} bytes available)")]
    ResultOverflow { declared: usize, available: usize },

    /// The requested interface kind is not available on this platform.
    #[error("{0} interface is not supported on this platform")]
    Unsupported(&'static str),

    /// The request could not be framed.
    #[error("frame error: {0}")]
    Frame(#[from] c2eprims_frame::FrameError),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Map a stream I/O failure, turning read/write timeouts into [`TransportError::Timeout`].
    pub(crate) fn from_stream_io(
        err: std::io::Error,
        object: &'static str,
        timeout: Option<Duration>,
    ) -> Self {
        match (err.kind(), timeout) {
            (std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut, Some(timeout)) => {
                Self::Timeout { object, timeout }
            }
            _ => Self::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
