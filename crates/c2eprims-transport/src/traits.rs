use c2eprims_frame::{CaosInput, Dialect, EventScript, Request, Response, ScriptClassifier};
use rand::distr::Alphanumeric;
use rand::Rng;
use tracing::{debug, warn};

use crate::error::{Result, TransportError};

/// Length of the random token `test_connection` round-trips through the engine.
const ECHO_TOKEN_LEN: usize = 16;

/// A connection to one engine instance.
///
/// Implementors supply the transport-specific pieces (`connect_body`,
/// `disconnect_body`, `raw_request`); the lifecycle state machine and request
/// framing are shared. Connection state is derived from handle presence, so
/// `is_connected` must be true exactly when every transport handle is held.
///
/// Implementors should call [`CaosInterface::close`] from `Drop`.
pub trait CaosInterface {
    /// Human-readable name of what this interface talks to, for errors and logs.
    fn target(&self) -> &str;

    /// How requests for this interface are framed.
    fn dialect(&self) -> Dialect;

    /// Whether transport handles are currently held.
    fn is_connected(&self) -> bool;

    /// Acquire every transport handle. Called only while disconnected.
    fn connect_body(&mut self) -> Result<()>;

    /// Release every transport handle. Called only while connected.
    ///
    /// Must leave the interface disconnected even when it returns an error.
    fn disconnect_body(&mut self) -> Result<()>;

    /// Send already-framed bytes and collect the engine's answer.
    ///
    /// Connects first if needed. The interface is disconnected again when
    /// this returns, whether or not the request succeeded.
    fn raw_request(&mut self, payload: &[u8]) -> Result<Response>;

    /// Connect to the engine.
    fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(TransportError::AlreadyConnected(self.target().to_string()));
        }
        self.connect_body()?;
        debug!(engine = self.target(), "connected to engine");
        Ok(())
    }

    /// Disconnect from the engine.
    fn disconnect(&mut self) -> Result<()> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected(self.target().to_string()));
        }
        let result = self.disconnect_body();
        debug_assert!(!self.is_connected(), "disconnect_body must drop all handles");
        debug!(engine = self.target(), ok = result.is_ok(), "disconnected from engine");
        result
    }

    /// Disconnect if connected; a no-op otherwise. Safe to call repeatedly.
    fn close(&mut self) -> Result<()> {
        if self.is_connected() {
            self.disconnect()
        } else {
            Ok(())
        }
    }

    /// Frame and send a request.
    fn request(&mut self, request: &Request) -> Result<Response> {
        let payload = request.to_payload(self.dialect());
        self.raw_request(&payload)
    }

    /// Run a piece of CAOS without storing it.
    ///
    /// Any output the CAOS produces comes back in the response text. To
    /// install event scripts use [`CaosInterface::add_script`] instead.
    fn execute(&mut self, caos: CaosInput<'_>) -> Result<Response> {
        let caos = caos.to_bytes()?;
        self.request(&Request::Execute(caos))
    }

    /// Install an event script into the scriptorium.
    ///
    /// `body` is the bare script: no `scrp` header, no `endm`. No syntax
    /// checking is done; inspect the response for signs of failure.
    fn add_script(
        &mut self,
        body: CaosInput<'_>,
        classifier: ScriptClassifier,
    ) -> Result<Response> {
        let script = EventScript::new(classifier, body)?;
        self.request(&Request::AddScript(script))
    }

    /// Check that the engine runs CAOS and answers.
    ///
    /// Sends a random token split in two and asks the engine to join the
    /// halves and print them; true only if the token comes back intact.
    fn test_connection(&mut self) -> Result<bool> {
        let token = echo_token();
        let (first, second) = token.split_at(token.len() / 2);
        let caos = format!(
            "sets va00 \"{first}\"\nsets va01 \"{second}\"\nadds va00 va01\nouts va00"
        );
        let response = self.execute(CaosInput::Text(&caos))?;
        let echoed = response.text();
        if echoed != token {
            debug!(engine = self.target(), expected = %token, got = %echoed, "echo mismatch");
        }
        Ok(echoed == token)
    }
}

impl<T: CaosInterface + ?Sized> CaosInterface for Box<T> {
    fn target(&self) -> &str {
        (**self).target()
    }

    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn connect_body(&mut self) -> Result<()> {
        (**self).connect_body()
    }

    fn disconnect_body(&mut self) -> Result<()> {
        (**self).disconnect_body()
    }

    fn raw_request(&mut self, payload: &[u8]) -> Result<Response> {
        (**self).raw_request(payload)
    }
}

/// Close an interface from `Drop`, logging instead of propagating.
pub(crate) fn close_on_drop<T: CaosInterface + ?Sized>(interface: &mut T) {
    if let Err(err) = interface.close() {
        warn!(engine = interface.target(), error = %err, "cleanup on drop failed");
    }
}

/// Disconnect after a request attempt and merge the two outcomes.
///
/// The request's own error wins; a teardown failure after a failed request
/// is only logged.
pub(crate) fn finish_request<T: CaosInterface + ?Sized>(
    interface: &mut T,
    outcome: Result<Response>,
) -> Result<Response> {
    let teardown = interface.close();
    match (outcome, teardown) {
        (Ok(response), Ok(())) => Ok(response),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(teardown_err)) => {
            warn!(
                engine = interface.target(),
                error = %teardown_err,
                "disconnect after failed request also failed"
            );
            Err(err)
        }
    }
}

fn echo_token() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(ECHO_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records what it was asked to do; answers every request with a canned reply.
    #[derive(Default)]
    struct RecordingInterface {
        handle: Option<()>,
        connects: usize,
        disconnects: usize,
        fail_teardown: bool,
        sent: Vec<Vec<u8>>,
    }

    impl CaosInterface for RecordingInterface {
        fn target(&self) -> &str {
            "recording"
        }

        fn dialect(&self) -> Dialect {
            Dialect::SharedMemory
        }

        fn is_connected(&self) -> bool {
            self.handle.is_some()
        }

        fn connect_body(&mut self) -> Result<()> {
            self.connects += 1;
            self.handle = Some(());
            Ok(())
        }

        fn disconnect_body(&mut self) -> Result<()> {
            self.disconnects += 1;
            self.handle = None;
            if self.fail_teardown {
                return Err(TransportError::Disconnect {
                    target: self.target().to_string(),
                    source: std::io::Error::other("handle already gone"),
                });
            }
            Ok(())
        }

        fn raw_request(&mut self, payload: &[u8]) -> Result<Response> {
            if !self.is_connected() {
                self.connect()?;
            }
            self.sent.push(payload.to_vec());
            finish_request(self, Ok(Response::new(&b"ok"[..])))
        }
    }

    #[test]
    fn connect_twice_is_rejected() {
        let mut iface = RecordingInterface::default();
        iface.connect().unwrap();
        let err = iface.connect().unwrap_err();
        assert!(matches!(err, TransportError::AlreadyConnected(_)));
        assert_eq!(iface.connects, 1);
    }

    #[test]
    fn disconnect_without_connect_is_rejected() {
        let mut iface = RecordingInterface::default();
        let err = iface.disconnect().unwrap_err();
        assert!(matches!(err, TransportError::NotConnected(_)));
        assert_eq!(iface.disconnects, 0);
    }

    #[test]
    fn close_is_idempotent() {
        let mut iface = RecordingInterface::default();
        iface.connect().unwrap();
        iface.disconnect().unwrap();
        iface.close().unwrap();
        iface.close().unwrap();
        assert_eq!(iface.disconnects, 1);
    }

    #[test]
    fn failed_teardown_still_disconnects() {
        let mut iface = RecordingInterface {
            fail_teardown: true,
            ..RecordingInterface::default()
        };
        iface.connect().unwrap();
        let err = iface.disconnect().unwrap_err();
        assert!(matches!(err, TransportError::Disconnect { .. }));
        assert!(!iface.is_connected());
        iface.connect().unwrap();
    }

    #[test]
    fn requests_connect_on_demand_and_leave_disconnected() {
        let mut iface = RecordingInterface::default();
        iface.execute("outs 1".into()).unwrap();
        iface.execute("outs 2".into()).unwrap();
        assert_eq!(iface.connects, 2);
        assert!(!iface.is_connected());
        assert_eq!(iface.sent[0], b"execute\nouts 1");
    }

    #[test]
    fn add_script_uses_canonical_framing() {
        let mut iface = RecordingInterface::default();
        iface
            .add_script("outs 1".into(), ScriptClassifier::new(2, 3, 4, 5))
            .unwrap();
        assert_eq!(iface.sent[0], b"scrp 2 3 4 5\nouts 1\nendm");
    }

    #[test]
    fn boxed_interfaces_share_the_lifecycle() {
        let mut iface: Box<dyn CaosInterface> = Box::new(RecordingInterface::default());
        iface.connect().unwrap();
        assert!(matches!(
            iface.connect(),
            Err(TransportError::AlreadyConnected(_))
        ));
        iface.close().unwrap();
        assert!(!iface.is_connected());
    }

    #[test]
    fn echo_tokens_are_alphanumeric() {
        let token = echo_token();
        assert_eq!(token.len(), ECHO_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, echo_token());
    }
}
