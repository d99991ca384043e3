//! Scoped wrappers over the Win32 objects a shared memory engine publishes.
//!
//! Every wrapper owns exactly one kernel handle, releases it through an
//! idempotent `close`, and closes again from `Drop` in case `close` was never
//! reached. Only opening existing objects is supported; engines create them.

mod backend;
mod event;
mod handle;
mod mapping;
mod mutex;
mod process;
mod wait;

#[cfg(test)]
pub(crate) mod fixture;

use std::ffi::CString;
use std::time::Duration;

use windows_sys::Win32::System::Threading::INFINITE;

pub use backend::{Win32Backend, Win32Objects};
pub use event::NamedEvent;
pub use handle::KernelHandle;
pub use mapping::FileMapping;
pub use mutex::NamedMutex;
pub use process::ProcessHandle;
pub use wait::{wait_any, WaitAny};

/// Convert a timeout to Win32 milliseconds. `None` is `INFINITE`.
pub(crate) fn timeout_ms(timeout: Option<Duration>) -> u32 {
    match timeout {
        None => INFINITE,
        Some(timeout) => u32::try_from(timeout.as_millis())
            .unwrap_or(INFINITE - 1)
            .min(INFINITE - 1),
    }
}

/// Object names go to the ANSI APIs and must not contain NUL.
pub(crate) fn object_name(name: &str) -> std::io::Result<CString> {
    CString::new(name).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("object name contains NUL: {name:?}"),
        )
    })
}
