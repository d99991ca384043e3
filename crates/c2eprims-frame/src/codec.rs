use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::encoding::CaosInput;
use crate::error::Result;

/// Prefix the shared-memory engine expects before ad-hoc CAOS.
pub const EXECUTE_PREFIX: &[u8] = b"execute\n";

/// Trailer that makes a socket engine run the request and close the stream.
pub const SOCKET_TRAILER: &[u8] = b"\nrscr";

/// Terminator appended after an event script body.
pub const SCRIPT_TERMINATOR: &[u8] = b"\nendm";

/// Which engine front door a request is framed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Socket engines take bare CAOS followed by [`SOCKET_TRAILER`].
    Socket,
    /// Shared-memory engines need [`EXECUTE_PREFIX`] before ad-hoc CAOS.
    SharedMemory,
}

/// The four numbers that identify an event script in the scriptorium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptClassifier {
    pub family: u32,
    pub genus: u32,
    pub species: u32,
    pub event: u32,
}

impl ScriptClassifier {
    pub fn new(family: u32, genus: u32, species: u32, event: u32) -> Self {
        Self {
            family,
            genus,
            species,
            event,
        }
    }

    /// The `scrp` header line, newline included.
    pub fn header(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for ScriptClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scrp {} {} {} {}",
            self.family, self.genus, self.species, self.event
        )
    }
}

/// A bare event script body with its classifier.
///
/// The body must not carry its own `scrp` header or `endm` terminator;
/// framing adds both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventScript {
    pub classifier: ScriptClassifier,
    pub body: Bytes,
}

impl EventScript {
    /// Build an event script, coercing the body once.
    pub fn new<'a>(classifier: ScriptClassifier, body: impl Into<CaosInput<'a>>) -> Result<Self> {
        Ok(Self {
            classifier,
            body: body.into().to_bytes()?,
        })
    }
}

/// One request to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Run CAOS once without storing it.
    Execute(Bytes),
    /// Install an event script into the scriptorium.
    AddScript(EventScript),
}

impl Request {
    /// Encode the request payload for a dialect.
    ///
    /// The socket trailer is not part of the payload; the socket transport
    /// writes it after every raw request.
    pub fn encode(&self, dialect: Dialect, dst: &mut BytesMut) {
        match self {
            Request::Execute(caos) => encode_execute(caos, dialect, dst),
            Request::AddScript(script) => encode_add_script(script, dst),
        }
    }

    /// Encode into a fresh buffer.
    pub fn to_payload(&self, dialect: Dialect) -> Bytes {
        let mut dst = BytesMut::new();
        self.encode(dialect, &mut dst);
        dst.freeze()
    }
}

/// Frame ad-hoc CAOS.
pub fn encode_execute(caos: &[u8], dialect: Dialect, dst: &mut BytesMut) {
    match dialect {
        Dialect::Socket => dst.reserve(caos.len()),
        Dialect::SharedMemory => {
            dst.reserve(EXECUTE_PREFIX.len() + caos.len());
            dst.put_slice(EXECUTE_PREFIX);
        }
    }
    dst.put_slice(caos);
    trace!(?dialect, size = caos.len(), "framed execute request");
}

/// Frame an event script installation.
///
/// Wire format, identical for both dialects:
/// ```text
/// scrp {family} {genus} {species} {event}\n{body}\nendm
/// ```
pub fn encode_add_script(script: &EventScript, dst: &mut BytesMut) {
    let header = script.classifier.header();
    dst.reserve(header.len() + script.body.len() + SCRIPT_TERMINATOR.len());
    dst.put_slice(header.as_bytes());
    dst.put_slice(&script.body);
    dst.put_slice(SCRIPT_TERMINATOR);
    trace!(
        classifier = %script.classifier,
        size = script.body.len(),
        "framed add-script request"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_script_frames_header_body_and_terminator() {
        let script = EventScript::new(ScriptClassifier::new(2, 3, 4, 5), "outs 1").unwrap();
        let payload = Request::AddScript(script).to_payload(Dialect::Socket);
        assert_eq!(payload.as_ref(), b"scrp 2 3 4 5\nouts 1\nendm");
    }

    #[test]
    fn add_script_is_dialect_independent() {
        let script = EventScript::new(ScriptClassifier::new(1, 2, 9, 1000), "wait 1").unwrap();
        let request = Request::AddScript(script);
        assert_eq!(
            request.to_payload(Dialect::Socket),
            request.to_payload(Dialect::SharedMemory)
        );
    }

    #[test]
    fn execute_is_bare_on_socket() {
        let payload = Request::Execute(Bytes::from_static(b"outs \"hi\"")).to_payload(Dialect::Socket);
        assert_eq!(payload.as_ref(), b"outs \"hi\"");
    }

    #[test]
    fn execute_is_prefixed_on_shared_memory() {
        let payload =
            Request::Execute(Bytes::from_static(b"outs \"hi\"")).to_payload(Dialect::SharedMemory);
        assert_eq!(payload.as_ref(), b"execute\nouts \"hi\"");
    }

    #[test]
    fn classifier_orders_fields_family_first() {
        let classifier = ScriptClassifier {
            event: 9,
            species: 7,
            genus: 3,
            family: 1,
        };
        assert_eq!(classifier.header(), "scrp 1 3 7 9\n");
    }

    #[test]
    fn event_script_rejects_unencodable_body() {
        let result = EventScript::new(ScriptClassifier::new(1, 1, 1, 1), "outs \"\u{4E2D}\"");
        assert!(result.is_err());
    }
}
