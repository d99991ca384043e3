use std::io;

use windows_sys::Win32::Foundation::HANDLE;
use windows_sys::Win32::System::Threading::{OpenEventA, PulseEvent, ResetEvent, EVENT_ALL_ACCESS};

use super::handle::KernelHandle;
use super::object_name;

/// An existing named event, opened by name.
#[derive(Debug)]
pub struct NamedEvent {
    handle: KernelHandle,
    name: String,
}

impl NamedEvent {
    pub fn open(name: &str) -> io::Result<Self> {
        let c_name = object_name(name)?;
        // SAFETY: `c_name` is a valid NUL-terminated string for the duration of the call.
        let raw = unsafe { OpenEventA(EVENT_ALL_ACCESS, 0, c_name.as_ptr().cast()) };
        Ok(Self {
            handle: KernelHandle::from_raw(raw)?,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_raw(&self) -> HANDLE {
        self.handle.as_raw()
    }

    /// Set the event to unsignaled.
    pub fn reset(&self) -> io::Result<()> {
        // SAFETY: the handle is open for the lifetime of `self`.
        if unsafe { ResetEvent(self.handle.as_raw()) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Signal the event just long enough to release current waiters.
    pub fn pulse(&self) -> io::Result<()> {
        // SAFETY: the handle is open for the lifetime of `self`.
        if unsafe { PulseEvent(self.handle.as_raw()) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn close(&mut self) -> io::Result<()> {
        self.handle.close()
    }
}
