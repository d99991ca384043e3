//! Shared memory transport for Windows engines.
//!
//! The engine publishes a file mapping, a mutex, and two events under its
//! game name. A request takes the mutex, writes CAOS into the mapping, pulses
//! the request event, and waits for the engine to answer. The protocol is
//! written against [`SyncBackend`] so it runs unchanged over any backend;
//! [`Win32Backend`](crate::win32::Win32Backend) is the real one.

pub mod backend;
pub mod layout;

use std::time::Duration;

use c2eprims_frame::{Dialect, Response};
use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::traits::{close_on_drop, finish_request, CaosInterface};

pub use backend::{EngineObjectNames, EngineObjects, SyncBackend, WaitOutcome};

/// Default game name engines register their objects under.
pub const DEFAULT_GAME_NAME: &str = "Docking Station";

/// Default size of the mapped buffer: 1 MiB.
pub const DEFAULT_MEMORY_SIZE: usize = 1024 * 1024;

/// Configuration for a shared memory connection.
#[derive(Debug, Clone)]
pub struct SharedMemoryConfig {
    /// Game name the engine registered its objects under.
    pub game_name: String,
    /// How many bytes of the mapping to map.
    pub memory_size: usize,
    /// Bound on the mutex wait and the reply wait. `None` waits forever.
    pub wait_timeout: Option<Duration>,
    /// Also wait on the engine process, so a dead engine ends the wait.
    pub require_process_access: bool,
}

impl Default for SharedMemoryConfig {
    fn default() -> Self {
        Self {
            game_name: DEFAULT_GAME_NAME.to_string(),
            memory_size: DEFAULT_MEMORY_SIZE,
            wait_timeout: None,
            require_process_access: true,
        }
    }
}

/// Shared memory interface to one engine.
///
/// Every request opens the engine's objects, runs one exchange under the
/// engine mutex, and closes them again.
pub struct SharedMemoryInterface<B: SyncBackend> {
    backend: B,
    config: SharedMemoryConfig,
    names: EngineObjectNames,
    objects: Option<B::Objects>,
}

#[cfg(windows)]
impl SharedMemoryInterface<crate::win32::Win32Backend> {
    /// Shared memory interface over the Win32 named objects.
    pub fn new(config: SharedMemoryConfig) -> Self {
        Self::with_backend(crate::win32::Win32Backend, config)
    }
}

impl<B: SyncBackend> SharedMemoryInterface<B> {
    /// Shared memory interface over an explicit backend.
    pub fn with_backend(backend: B, config: SharedMemoryConfig) -> Self {
        let names = EngineObjectNames::for_game(&config.game_name);
        Self {
            backend,
            config,
            names,
            objects: None,
        }
    }

    pub fn config(&self) -> &SharedMemoryConfig {
        &self.config
    }

    /// The object names derived from the game name.
    pub fn names(&self) -> &EngineObjectNames {
        &self.names
    }

    /// Run one exchange under the engine mutex, releasing it on every path.
    fn exchange(&mut self, payload: &[u8]) -> Result<Response> {
        let timeout = self.config.wait_timeout;
        let check_peer = self.config.require_process_access;
        let objects = self
            .objects
            .as_mut()
            .ok_or_else(|| TransportError::NotConnected(self.config.game_name.clone()))?;

        objects.lock(timeout)?;
        let outcome = transact(objects, payload, check_peer, timeout);
        let unlocked = objects.unlock();

        match (outcome, unlocked) {
            (Ok(response), Ok(())) => Ok(response),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), unlocked) => {
                if let Err(unlock_err) = unlocked {
                    warn!(error = %unlock_err, "releasing engine mutex after failed request");
                }
                Err(err)
            }
        }
    }
}

fn transact<O: EngineObjects>(
    objects: &mut O,
    payload: &[u8],
    check_peer: bool,
    timeout: Option<Duration>,
) -> Result<Response> {
    layout::check_magic(objects.buffer())?;
    let pid = layout::process_id(objects.buffer());

    layout::write_request(objects.buffer_mut(), payload)?;
    objects.reset_result()?;
    objects.pulse_request()?;

    match objects.wait_for_reply(check_peer.then_some(pid), timeout)? {
        WaitOutcome::PeerExited => return Err(TransportError::PeerExited { pid }),
        outcome => debug!(?outcome, pid, "engine answered"),
    }

    let status = layout::read_status(objects.buffer());
    let data = layout::read_result(objects.buffer(), status.result_length)?;
    debug!(
        size = status.result_length,
        error = status.error,
        "read shared memory result"
    );
    Ok(Response::from_parts(
        data,
        Some(status.result_length),
        Some(status.error),
        false,
    )?)
}

impl<B: SyncBackend> CaosInterface for SharedMemoryInterface<B> {
    fn target(&self) -> &str {
        &self.config.game_name
    }

    fn dialect(&self) -> Dialect {
        Dialect::SharedMemory
    }

    fn is_connected(&self) -> bool {
        self.objects.is_some()
    }

    fn connect_body(&mut self) -> Result<()> {
        let objects = self
            .backend
            .open(&self.names, self.config.memory_size)
            .map_err(|source| TransportError::Connect {
                target: self.config.game_name.clone(),
                source,
            })?;
        self.objects = Some(objects);
        Ok(())
    }

    fn disconnect_body(&mut self) -> Result<()> {
        let Some(objects) = self.objects.take() else {
            return Ok(());
        };
        objects.close().map_err(|source| TransportError::Disconnect {
            target: self.config.game_name.clone(),
            source,
        })
    }

    fn raw_request(&mut self, payload: &[u8]) -> Result<Response> {
        if !self.is_connected() {
            self.connect()?;
        }
        debug!(engine = %self.config.game_name, size = payload.len(), "shared memory request");
        let outcome = self.exchange(payload);
        finish_request(self, outcome)
    }
}

impl<B: SyncBackend> Drop for SharedMemoryInterface<B> {
    fn drop(&mut self) {
        close_on_drop(self);
    }
}
