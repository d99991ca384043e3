use std::io;

use windows_sys::Win32::Foundation::HANDLE;
use windows_sys::Win32::System::Threading::{OpenProcess, PROCESS_SYNCHRONIZE};

use super::handle::KernelHandle;

/// A handle to another process, opened only to wait on its exit.
///
/// Opening fails when the engine runs in a different security context, for
/// example elevated while the client is not.
#[derive(Debug)]
pub struct ProcessHandle {
    handle: KernelHandle,
    pid: u32,
}

impl ProcessHandle {
    pub fn open(pid: u32) -> io::Result<Self> {
        // SAFETY: plain FFI call with value arguments.
        let raw = unsafe { OpenProcess(PROCESS_SYNCHRONIZE, 0, pid) };
        Ok(Self {
            handle: KernelHandle::from_raw(raw)?,
            pid,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn as_raw(&self) -> HANDLE {
        self.handle.as_raw()
    }

    pub fn close(&mut self) -> io::Result<()> {
        self.handle.close()
    }
}
