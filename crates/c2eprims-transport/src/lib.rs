//! Connection lifecycle and engine transports.
//!
//! Two ways to reach a running engine, behind one [`CaosInterface`] trait:
//! - [`SocketInterface`]: TCP, used by the Linux engine and openc2e
//! - [`SharedMemoryInterface`]: named shared memory with a mutex and events,
//!   used by the Windows engine
//!
//! Both connect on demand and disconnect after every request.

pub mod error;
pub mod kind;
pub mod shm;
pub mod socket;
pub mod traits;

#[cfg(windows)]
pub mod win32;

pub use error::{Result, TransportError};
pub use kind::{open_interface, InterfaceKind, InterfaceOptions};
pub use shm::{SharedMemoryConfig, SharedMemoryInterface};
pub use socket::{SocketConfig, SocketInterface};
pub use traits::CaosInterface;

#[cfg(windows)]
pub use win32::Win32Backend;
