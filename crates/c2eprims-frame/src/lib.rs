//! CAOS request framing and engine response decoding.
//!
//! Everything here is transport-agnostic:
//! - Request text is coerced to single-byte Latin-1 once, at the boundary
//! - `execute` and `add_script` requests are framed per [`Dialect`]
//! - [`Response`] unifies the socket (stream-until-close) and shared-memory
//!   (declared length plus error flag) answer models behind one decode rule

pub mod codec;
pub mod encoding;
pub mod error;
pub mod response;

pub use codec::{
    encode_add_script, encode_execute, Dialect, EventScript, Request, ScriptClassifier,
    EXECUTE_PREFIX, SCRIPT_TERMINATOR, SOCKET_TRAILER,
};
pub use encoding::{decode_cp1252, encode_latin1, CaosInput};
pub use error::{FrameError, Result};
pub use response::Response;
