//! Engine-side objects for tests: creates what a running engine publishes.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use windows_sys::Win32::Foundation::{HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::System::Memory::{CreateFileMappingA, PAGE_READWRITE};
use windows_sys::Win32::System::Threading::{CreateEventA, CreateMutexA, SetEvent};

use super::{object_name, FileMapping, KernelHandle, NamedEvent};
use crate::shm::layout::{DATA_OFFSET, MAGIC, PROCESS_ID_OFFSET, RESULT_LENGTH_OFFSET, STATUS_OFFSET};
use crate::shm::EngineObjectNames;

pub(crate) const MEMORY_SIZE: usize = 4096;

/// Give up on a stuck exchange instead of hanging the test run.
const ENGINE_DEADLINE: Duration = Duration::from_secs(10);

/// A mapping, mutex, and both events created under a fresh game name.
///
/// The objects live as long as the fixture; clients open them by name.
pub(crate) struct EngineFixture {
    pub game_name: String,
    pub names: EngineObjectNames,
    _mapping: KernelHandle,
    _mutex: KernelHandle,
    request: KernelHandle,
    result: KernelHandle,
}

impl EngineFixture {
    /// Objects whose header names this test process as the engine.
    pub fn create() -> Self {
        Self::with_pid(std::process::id())
    }

    /// Objects whose header names `pid` as the engine process.
    pub fn with_pid(pid: u32) -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let game_name = format!(
            "c2eprims-test-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        );
        let names = EngineObjectNames::for_game(&game_name);

        let fixture = Self {
            _mapping: create_mapping(&names.memory).expect("create mapping"),
            _mutex: create_mutex(&names.mutex).expect("create mutex"),
            // The engine pulses requests and signals results that stay set
            // until the client resets them.
            request: create_event(&names.request_event, false).expect("create request event"),
            result: create_event(&names.result_event, true).expect("create result event"),
            game_name,
            names,
        };

        let mut view = FileMapping::open(&fixture.names.memory, MEMORY_SIZE).expect("map header");
        let buf = view.as_mut_slice();
        buf[..4].copy_from_slice(&MAGIC);
        buf[PROCESS_ID_OFFSET..PROCESS_ID_OFFSET + 4].copy_from_slice(&pid.to_le_bytes());
        view.close().expect("unmap header");
        fixture
    }

    pub fn signal_result(&self) {
        set_event(self.result.as_raw());
    }

    pub fn signal_request(&self) {
        set_event(self.request.as_raw());
    }

    /// Answer one request on another thread.
    ///
    /// The engine waits for `expected` (terminator included) to appear in
    /// the buffer, writes `reply` with the `error` status, and keeps setting
    /// the result event until [`Responder::finish`] is called.
    pub fn respond(&self, expected: &[u8], reply: &[u8], error: bool) -> Responder {
        let memory = self.names.memory.clone();
        let result_event = self.names.result_event.clone();
        let expected = expected.to_vec();
        let reply = reply.to_vec();
        let done = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&done);

        let handle = thread::spawn(move || {
            let mut view = FileMapping::open(&memory, MEMORY_SIZE).expect("engine view");
            let result = NamedEvent::open(&result_event).expect("engine result event");
            let deadline = Instant::now() + ENGINE_DEADLINE;

            while !view.as_slice()[DATA_OFFSET..].starts_with(&expected) {
                if Instant::now() > deadline {
                    return false;
                }
                thread::sleep(Duration::from_millis(5));
            }

            let buf = view.as_mut_slice();
            buf[STATUS_OFFSET..STATUS_OFFSET + 4].copy_from_slice(&u32::from(error).to_le_bytes());
            buf[RESULT_LENGTH_OFFSET..RESULT_LENGTH_OFFSET + 4]
                .copy_from_slice(&(reply.len() as u32).to_le_bytes());
            buf[DATA_OFFSET..DATA_OFFSET + reply.len()].copy_from_slice(&reply);

            // The client resets the result event before pulsing, so a single
            // set could land too early.
            while !stop.load(Ordering::SeqCst) && Instant::now() < deadline {
                set_event(result.as_raw());
                thread::sleep(Duration::from_millis(10));
            }
            true
        });

        Responder { done, handle }
    }
}

/// The engine thread started by [`EngineFixture::respond`].
pub(crate) struct Responder {
    done: Arc<AtomicBool>,
    handle: JoinHandle<bool>,
}

impl Responder {
    /// Stop signaling. True if the engine saw the expected request.
    pub fn finish(self) -> bool {
        self.done.store(true, Ordering::SeqCst);
        self.handle.join().expect("engine thread panicked")
    }
}

fn create_mapping(name: &str) -> io::Result<KernelHandle> {
    let c_name = object_name(name)?;
    // SAFETY: `c_name` is a valid NUL-terminated string for the duration of the call.
    let raw = unsafe {
        CreateFileMappingA(
            INVALID_HANDLE_VALUE,
            std::ptr::null(),
            PAGE_READWRITE,
            0,
            MEMORY_SIZE as u32,
            c_name.as_ptr().cast(),
        )
    };
    KernelHandle::from_raw(raw)
}

fn create_mutex(name: &str) -> io::Result<KernelHandle> {
    let c_name = object_name(name)?;
    // SAFETY: as above.
    let raw = unsafe { CreateMutexA(std::ptr::null(), 0, c_name.as_ptr().cast()) };
    KernelHandle::from_raw(raw)
}

fn create_event(name: &str, manual_reset: bool) -> io::Result<KernelHandle> {
    let c_name = object_name(name)?;
    // SAFETY: as above.
    let raw = unsafe {
        CreateEventA(
            std::ptr::null(),
            i32::from(manual_reset),
            0,
            c_name.as_ptr().cast(),
        )
    };
    KernelHandle::from_raw(raw)
}

pub(crate) fn set_event(handle: HANDLE) {
    // SAFETY: callers pass an open event handle.
    assert_ne!(unsafe { SetEvent(handle) }, 0, "SetEvent failed");
}
