use std::io;
use std::time::Duration;

use tracing::warn;
use windows_sys::Win32::Foundation::{WAIT_ABANDONED, WAIT_OBJECT_0, WAIT_TIMEOUT};
use windows_sys::Win32::System::Threading::{
    OpenMutexA, ReleaseMutex, WaitForSingleObject, MUTEX_ALL_ACCESS,
};

use super::handle::KernelHandle;
use super::{object_name, timeout_ms};
use crate::error::{Result, TransportError};

/// An existing named mutex, opened by name.
///
/// Tracks whether this wrapper holds the mutex so release is idempotent and
/// a held mutex is released before its handle is closed.
#[derive(Debug)]
pub struct NamedMutex {
    handle: KernelHandle,
    name: String,
    acquired: bool,
}

impl NamedMutex {
    pub fn open(name: &str) -> io::Result<Self> {
        let c_name = object_name(name)?;
        // SAFETY: `c_name` is a valid NUL-terminated string for the duration of the call.
        let raw = unsafe { OpenMutexA(MUTEX_ALL_ACCESS, 0, c_name.as_ptr().cast()) };
        Ok(Self {
            handle: KernelHandle::from_raw(raw)?,
            name: name.to_string(),
            acquired: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    /// Wait up to `timeout` for ownership. `None` waits forever.
    ///
    /// An abandoned mutex (its previous owner died holding it) is taken over
    /// with a warning.
    pub fn acquire(&mut self, timeout: Option<Duration>) -> Result<()> {
        if self.acquired {
            return Ok(());
        }
        // SAFETY: the handle is open for the lifetime of `self`.
        let status = unsafe { WaitForSingleObject(self.handle.as_raw(), timeout_ms(timeout)) };
        match status {
            WAIT_OBJECT_0 => {
                self.acquired = true;
                Ok(())
            }
            WAIT_ABANDONED => {
                warn!(mutex = %self.name, "took over abandoned engine mutex");
                self.acquired = true;
                Ok(())
            }
            WAIT_TIMEOUT => Err(TransportError::Timeout {
                object: "engine mutex",
                timeout: timeout.unwrap_or(Duration::MAX),
            }),
            _ => Err(TransportError::Wait {
                object: "engine mutex",
                source: io::Error::last_os_error(),
            }),
        }
    }

    /// Release ownership if held.
    pub fn release(&mut self) -> io::Result<()> {
        if !self.acquired {
            return Ok(());
        }
        self.acquired = false;
        // SAFETY: the handle is open and this thread owns the mutex.
        if unsafe { ReleaseMutex(self.handle.as_raw()) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Release if held, then close the handle. Both steps always run.
    pub fn close(&mut self) -> io::Result<()> {
        let released = self.release();
        let closed = self.handle.close();
        released.and(closed)
    }
}

impl Drop for NamedMutex {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;

    use super::*;
    use crate::win32::fixture::EngineFixture;

    #[test]
    fn acquire_times_out_while_another_thread_holds_it() {
        let fixture = EngineFixture::create();
        let name = fixture.names.mutex.clone();
        let (held_tx, held_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let holder = thread::spawn(move || {
            let mut mutex = NamedMutex::open(&name).expect("open mutex");
            mutex.acquire(None).expect("acquire mutex");
            held_tx.send(()).unwrap();
            let _ = done_rx.recv();
            mutex.release().expect("release mutex");
        });
        held_rx.recv().unwrap();

        let mut mutex = NamedMutex::open(&fixture.names.mutex).unwrap();
        let timeout = Duration::from_millis(50);
        match mutex.acquire(Some(timeout)) {
            Err(TransportError::Timeout { timeout: waited, .. }) => assert_eq!(waited, timeout),
            other => panic!("expected Timeout, got {other:?}"),
        }
        assert!(!mutex.is_acquired());

        done_tx.send(()).unwrap();
        holder.join().unwrap();
        mutex.acquire(Some(Duration::from_secs(1))).unwrap();
        assert!(mutex.is_acquired());
        mutex.close().unwrap();
    }

    #[test]
    fn abandoned_mutex_is_taken_over() {
        let fixture = EngineFixture::create();
        let name = fixture.names.mutex.clone();
        thread::spawn(move || {
            let mut mutex = NamedMutex::open(&name).expect("open mutex");
            mutex.acquire(None).expect("acquire mutex");
            // Exit while owning it, without release.
            std::mem::forget(mutex);
        })
        .join()
        .unwrap();

        let mut mutex = NamedMutex::open(&fixture.names.mutex).unwrap();
        mutex.acquire(Some(Duration::from_secs(1))).unwrap();
        assert!(mutex.is_acquired());
        mutex.close().unwrap();
    }

    #[test]
    fn release_is_idempotent() {
        let fixture = EngineFixture::create();
        let mut mutex = NamedMutex::open(&fixture.names.mutex).unwrap();
        assert_eq!(mutex.name(), fixture.names.mutex);

        mutex.release().unwrap();
        mutex.acquire(None).unwrap();
        mutex.release().unwrap();
        mutex.release().unwrap();
        mutex.close().unwrap();
        mutex.close().unwrap();
    }
}
