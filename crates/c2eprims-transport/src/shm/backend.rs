use std::time::Duration;

use crate::error::Result;

/// Names of the kernel objects an engine publishes under its game name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineObjectNames {
    /// File mapping holding the request/result buffer.
    pub memory: String,
    /// Mutex serializing clients of the same engine.
    pub mutex: String,
    /// Event the client pulses to hand a request over.
    pub request_event: String,
    /// Event the engine signals when the result is ready.
    pub result_event: String,
}

impl EngineObjectNames {
    pub fn for_game(game_name: &str) -> Self {
        Self {
            memory: format!("{game_name}_mem"),
            mutex: format!("{game_name}_mutex"),
            request_event: format!("{game_name}_request"),
            result_event: format!("{game_name}_result"),
        }
    }
}

/// Which object ended a wait for the engine's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The engine signaled the result event.
    Result,
    /// The request event was signaled back.
    Request,
    /// The engine process handle became signaled: the process ended.
    PeerExited,
}

/// The opened set of objects for one connection.
///
/// Owned exclusively by one interface for its connected lifetime. Every
/// object must be released by [`EngineObjects::close`], or by `Drop` if the
/// set is abandoned.
pub trait EngineObjects {
    /// The mapped shared buffer.
    fn buffer(&self) -> &[u8];

    fn buffer_mut(&mut self) -> &mut [u8];

    /// Acquire the engine mutex. `None` waits forever.
    ///
    /// Fails with `Timeout` if the wait runs out, `Wait` if the OS call fails.
    fn lock(&mut self, timeout: Option<Duration>) -> Result<()>;

    /// Release the engine mutex. A no-op if it is not held.
    fn unlock(&mut self) -> Result<()>;

    /// Put the result event back into the unsignaled state.
    fn reset_result(&mut self) -> Result<()>;

    /// Momentarily signal the request event to wake the engine.
    fn pulse_request(&mut self) -> Result<()>;

    /// Wait until any of result event, request event, or (when `peer` is
    /// given) the engine process becomes signaled.
    ///
    /// A process handle opened for the wait is closed before returning, on
    /// every path.
    fn wait_for_reply(&mut self, peer: Option<u32>, timeout: Option<Duration>)
        -> Result<WaitOutcome>;

    /// Release the mutex if held and close every object.
    ///
    /// Attempts every release even if an earlier one fails; reports the
    /// first failure.
    fn close(self) -> std::io::Result<()>
    where
        Self: Sized;
}

/// Opens the named objects an engine publishes.
pub trait SyncBackend {
    type Objects: EngineObjects;

    /// Open (never create) the mapping, mutex, and both events.
    ///
    /// On failure, anything opened so far is released before returning.
    fn open(&self, names: &EngineObjectNames, memory_size: usize)
        -> std::io::Result<Self::Objects>;
}
