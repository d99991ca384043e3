use std::io;
use std::time::Duration;

use windows_sys::Win32::Foundation::{HANDLE, WAIT_ABANDONED_0, WAIT_OBJECT_0, WAIT_TIMEOUT};
use windows_sys::Win32::System::Threading::WaitForMultipleObjects;

use super::timeout_ms;

/// How a wait on several handles ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitAny {
    /// The handle at this index was signaled.
    Signaled(usize),
    /// The mutex at this index was abandoned by its owner.
    Abandoned(usize),
    TimedOut,
}

/// Wait until any one of `handles` is signaled. `None` waits forever.
///
/// This is a first-to-signal wait, not a wait-for-all.
pub fn wait_any(handles: &[HANDLE], timeout: Option<Duration>) -> io::Result<WaitAny> {
    let count = u32::try_from(handles.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many handles"))?;

    // SAFETY: `handles` holds `count` open handles and outlives the call.
    let status = unsafe { WaitForMultipleObjects(count, handles.as_ptr(), 0, timeout_ms(timeout)) };

    if status == WAIT_TIMEOUT {
        return Ok(WaitAny::TimedOut);
    }
    if (WAIT_OBJECT_0..WAIT_OBJECT_0 + count).contains(&status) {
        return Ok(WaitAny::Signaled((status - WAIT_OBJECT_0) as usize));
    }
    if (WAIT_ABANDONED_0..WAIT_ABANDONED_0 + count).contains(&status) {
        return Ok(WaitAny::Abandoned((status - WAIT_ABANDONED_0) as usize));
    }
    Err(io::Error::last_os_error())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::win32::fixture::EngineFixture;
    use crate::win32::NamedEvent;

    #[test]
    fn reports_which_handle_fired() {
        let fixture = EngineFixture::create();
        let result = NamedEvent::open(&fixture.names.result_event).unwrap();
        let request = NamedEvent::open(&fixture.names.request_event).unwrap();
        let handles = [result.as_raw(), request.as_raw()];

        assert_eq!(
            wait_any(&handles, Some(Duration::from_millis(20))).unwrap(),
            WaitAny::TimedOut
        );

        fixture.signal_request();
        assert_eq!(
            wait_any(&handles, Some(Duration::from_secs(1))).unwrap(),
            WaitAny::Signaled(1)
        );

        fixture.signal_result();
        assert_eq!(
            wait_any(&handles, Some(Duration::from_secs(1))).unwrap(),
            WaitAny::Signaled(0)
        );
    }

    #[test]
    fn empty_handle_list_is_an_error() {
        assert!(wait_any(&[], Some(Duration::from_millis(1))).is_err());
    }
}
