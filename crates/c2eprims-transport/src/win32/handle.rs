use std::io;

use windows_sys::Win32::Foundation::{CloseHandle, HANDLE};

/// An owned kernel handle, closed exactly once.
#[derive(Debug)]
pub struct KernelHandle {
    raw: HANDLE,
}

impl KernelHandle {
    /// Take ownership of a handle returned by an `Open*` call.
    ///
    /// A null handle means the call failed; the thread's last OS error is returned.
    pub(crate) fn from_raw(raw: HANDLE) -> io::Result<Self> {
        if raw.is_null() {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { raw })
    }

    pub fn as_raw(&self) -> HANDLE {
        self.raw
    }

    pub fn is_closed(&self) -> bool {
        self.raw.is_null()
    }

    /// Close the handle. Closing an already closed handle is a no-op.
    pub fn close(&mut self) -> io::Result<()> {
        if self.raw.is_null() {
            return Ok(());
        }
        let raw = std::mem::replace(&mut self.raw, std::ptr::null_mut());
        // SAFETY: `raw` came from a successful Open* call, is owned by this
        // wrapper, and has not been closed yet (it was non-null).
        if unsafe { CloseHandle(raw) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl Drop for KernelHandle {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
