use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, TransportError};
use crate::shm::{SharedMemoryConfig, DEFAULT_GAME_NAME, DEFAULT_MEMORY_SIZE};
use crate::socket::{SocketConfig, SocketInterface, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT};
use crate::traits::CaosInterface;

/// Which transport reaches the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceKind {
    /// TCP socket, used by the Linux engine and openc2e.
    Socket,
    /// Named shared memory, used by the Windows engine.
    SharedMemory,
}

impl InterfaceKind {
    pub const ALL: [InterfaceKind; 2] = [InterfaceKind::Socket, InterfaceKind::SharedMemory];

    pub fn name(self) -> &'static str {
        match self {
            InterfaceKind::Socket => "socket",
            InterfaceKind::SharedMemory => "shared-memory",
        }
    }

    /// Whether this build can open this kind of interface.
    pub fn supported(self) -> bool {
        match self {
            InterfaceKind::Socket => true,
            InterfaceKind::SharedMemory => cfg!(windows),
        }
    }

    /// Shared memory on Windows, socket elsewhere.
    pub fn default_for_platform() -> Self {
        if cfg!(windows) {
            InterfaceKind::SharedMemory
        } else {
            InterfaceKind::Socket
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InterfaceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "socket" | "tcp" => Ok(InterfaceKind::Socket),
            "shared-memory" | "shared_memory" | "shm" => Ok(InterfaceKind::SharedMemory),
            other => Err(format!(
                "unknown interface kind {other:?} (expected socket or shared-memory)"
            )),
        }
    }
}

/// Settings for either kind of interface.
///
/// Each kind reads only the fields it understands.
#[derive(Debug, Clone)]
pub struct InterfaceOptions {
    pub game_name: String,
    pub host: String,
    pub port: u16,
    /// Socket timeout, or the shared memory wait bound. `None` means no limit.
    pub timeout: Option<Duration>,
    pub memory_size: usize,
    pub require_process_access: bool,
}

impl Default for InterfaceOptions {
    fn default() -> Self {
        Self {
            game_name: DEFAULT_GAME_NAME.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: Some(DEFAULT_TIMEOUT),
            memory_size: DEFAULT_MEMORY_SIZE,
            require_process_access: true,
        }
    }
}

impl InterfaceOptions {
    pub fn socket_config(&self) -> SocketConfig {
        SocketConfig {
            host: self.host.clone(),
            port: self.port,
            timeout: self.timeout,
        }
    }

    pub fn shared_memory_config(&self) -> SharedMemoryConfig {
        SharedMemoryConfig {
            game_name: self.game_name.clone(),
            memory_size: self.memory_size,
            wait_timeout: self.timeout,
            require_process_access: self.require_process_access,
        }
    }
}

/// Open a disconnected interface of the given kind.
pub fn open_interface(
    kind: InterfaceKind,
    options: &InterfaceOptions,
) -> Result<Box<dyn CaosInterface>> {
    match kind {
        InterfaceKind::Socket => Ok(Box::new(SocketInterface::new(options.socket_config()))),
        InterfaceKind::SharedMemory => open_shared_memory(options),
    }
}

#[cfg(windows)]
fn open_shared_memory(options: &InterfaceOptions) -> Result<Box<dyn CaosInterface>> {
    Ok(Box::new(crate::shm::SharedMemoryInterface::new(
        options.shared_memory_config(),
    )))
}

#[cfg(not(windows))]
fn open_shared_memory(_options: &InterfaceOptions) -> Result<Box<dyn CaosInterface>> {
    Err(TransportError::Unsupported(InterfaceKind::SharedMemory.name()))
}
