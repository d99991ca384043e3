use std::time::Duration;

use tracing::{debug, warn};

use super::{wait_any, FileMapping, NamedEvent, NamedMutex, ProcessHandle, WaitAny};
use crate::error::{Result, TransportError};
use crate::shm::{EngineObjectNames, EngineObjects, SyncBackend, WaitOutcome};

const REPLY: &str = "engine reply";

/// Opens engine objects through the Win32 API.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Backend;

/// The mapping, mutex, and events of one engine connection.
#[derive(Debug)]
pub struct Win32Objects {
    mapping: FileMapping,
    mutex: NamedMutex,
    result: NamedEvent,
    request: NamedEvent,
}

impl SyncBackend for Win32Backend {
    type Objects = Win32Objects;

    fn open(&self, names: &EngineObjectNames, memory_size: usize) -> std::io::Result<Win32Objects> {
        // Anything opened before a failing step is closed by its Drop.
        let mapping = FileMapping::open(&names.memory, memory_size)?;
        let mutex = NamedMutex::open(&names.mutex)?;
        let result = NamedEvent::open(&names.result_event)?;
        let request = NamedEvent::open(&names.request_event)?;
        debug!(memory = %names.memory, size = memory_size, "opened engine objects");
        Ok(Win32Objects {
            mapping,
            mutex,
            result,
            request,
        })
    }
}

impl EngineObjects for Win32Objects {
    fn buffer(&self) -> &[u8] {
        self.mapping.as_slice()
    }

    fn buffer_mut(&mut self) -> &mut [u8] {
        self.mapping.as_mut_slice()
    }

    fn lock(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.mutex.acquire(timeout)
    }

    fn unlock(&mut self) -> Result<()> {
        self.mutex.release().map_err(|source| TransportError::Os {
            operation: "release engine mutex",
            source,
        })
    }

    fn reset_result(&mut self) -> Result<()> {
        self.result.reset().map_err(|source| TransportError::Os {
            operation: "reset result event",
            source,
        })
    }

    fn pulse_request(&mut self) -> Result<()> {
        self.request.pulse().map_err(|source| TransportError::Os {
            operation: "pulse request event",
            source,
        })
    }

    fn wait_for_reply(
        &mut self,
        peer: Option<u32>,
        timeout: Option<Duration>,
    ) -> Result<WaitOutcome> {
        let mut process = peer
            .map(ProcessHandle::open)
            .transpose()
            .map_err(|source| TransportError::Os {
                operation: "open engine process",
                source,
            })?;

        let mut handles = vec![self.result.as_raw(), self.request.as_raw()];
        if let Some(process) = &process {
            handles.push(process.as_raw());
        }

        let waited = wait_any(&handles, timeout);

        if let Some(process) = process.as_mut() {
            if let Err(err) = process.close() {
                warn!(pid = process.pid(), error = %err, "closing engine process handle");
            }
        }

        match waited {
            Ok(WaitAny::Signaled(0) | WaitAny::Abandoned(0)) => Ok(WaitOutcome::Result),
            Ok(WaitAny::Signaled(1) | WaitAny::Abandoned(1)) => Ok(WaitOutcome::Request),
            Ok(WaitAny::Signaled(_) | WaitAny::Abandoned(_)) => Ok(WaitOutcome::PeerExited),
            Ok(WaitAny::TimedOut) => Err(TransportError::Timeout {
                object: REPLY,
                timeout: timeout.unwrap_or(Duration::MAX),
            }),
            Err(source) => Err(TransportError::Wait {
                object: REPLY,
                source,
            }),
        }
    }

    fn close(mut self) -> std::io::Result<()> {
        let outcomes = [
            self.request.close(),
            self.result.close(),
            self.mutex.close(),
            self.mapping.close(),
        ];
        outcomes.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::process::Command;
    use std::thread;

    use c2eprims_frame::CaosInput;

    use super::*;
    use crate::shm::{SharedMemoryConfig, SharedMemoryInterface};
    use crate::traits::CaosInterface;
    use crate::win32::fixture::{EngineFixture, MEMORY_SIZE};

    fn config(game_name: &str) -> SharedMemoryConfig {
        SharedMemoryConfig {
            game_name: game_name.to_string(),
            memory_size: MEMORY_SIZE,
            wait_timeout: Some(Duration::from_secs(5)),
            require_process_access: true,
        }
    }

    #[test]
    fn execute_round_trips_through_engine_objects() {
        let fixture = EngineFixture::create();
        let engine = fixture.respond(b"execute\nouts \"hi\"\0", b"hi", false);

        let mut iface = SharedMemoryInterface::new(config(&fixture.game_name));
        let response = iface.execute(CaosInput::Text("outs \"hi\"")).unwrap();

        assert!(engine.finish(), "engine never saw the request");
        assert_eq!(response.text(), "hi");
        assert_eq!(response.error(), Some(false));
        assert_eq!(response.declared_length(), Some(2));
        assert!(!iface.is_connected());
    }

    #[test]
    fn engine_error_status_reaches_the_response() {
        let fixture = EngineFixture::create();
        let engine = fixture.respond(b"execute\nbogus\0", b"Unknown command", true);

        let mut iface = SharedMemoryInterface::new(config(&fixture.game_name));
        let response = iface.execute(CaosInput::Text("bogus")).unwrap();

        assert!(engine.finish());
        assert_eq!(response.error(), Some(true));
        assert_eq!(response.text(), "Unknown command");
    }

    #[test]
    fn missing_engine_objects_fail_to_connect() {
        let game_name = format!("c2eprims-test-missing-{}", std::process::id());
        let mut iface = SharedMemoryInterface::new(config(&game_name));

        match iface.connect() {
            Err(TransportError::Connect { target, .. }) => assert_eq!(target, game_name),
            other => panic!("expected Connect error, got {other:?}"),
        }
        assert!(!iface.is_connected());
    }

    #[test]
    fn wait_maps_each_handle_to_its_outcome() {
        let fixture = EngineFixture::create();
        let mut objects = Win32Backend.open(&fixture.names, MEMORY_SIZE).unwrap();
        let timeout = Some(Duration::from_secs(1));

        fixture.signal_result();
        assert_eq!(objects.wait_for_reply(None, timeout).unwrap(), WaitOutcome::Result);

        objects.reset_result().unwrap();
        fixture.signal_request();
        assert_eq!(objects.wait_for_reply(None, timeout).unwrap(), WaitOutcome::Request);

        let pid = std::process::id();
        match objects.wait_for_reply(Some(pid), Some(Duration::from_millis(50))) {
            Err(TransportError::Timeout { object, .. }) => assert_eq!(object, REPLY),
            other => panic!("expected Timeout, got {other:?}"),
        }
        objects.close().unwrap();
    }

    #[test]
    fn engine_exit_ends_the_wait() {
        let mut child = Command::new("cmd")
            .args(["/C", "exit 0"])
            .spawn()
            .expect("spawn short-lived process");
        child.wait().expect("wait for short-lived process");
        // `child` keeps the process object alive, so its pid still opens.
        let fixture = EngineFixture::with_pid(child.id());

        let mut iface = SharedMemoryInterface::new(config(&fixture.game_name));
        match iface.execute(CaosInput::Text("outs 1")) {
            Err(TransportError::PeerExited { pid }) => assert_eq!(pid, child.id()),
            other => panic!("expected PeerExited, got {other:?}"),
        }
        assert!(!iface.is_connected());
    }

    #[test]
    fn close_releases_a_held_mutex() {
        let fixture = EngineFixture::create();
        let mut objects = Win32Backend.open(&fixture.names, MEMORY_SIZE).unwrap();
        objects.lock(Some(Duration::from_secs(1))).unwrap();
        objects.close().unwrap();

        // Mutex ownership is per thread, so only another thread can tell.
        let mutex_name = fixture.names.mutex.clone();
        let acquired = thread::spawn(move || {
            let mut mutex = NamedMutex::open(&mutex_name).expect("open mutex");
            let acquired = mutex.acquire(Some(Duration::from_millis(100))).is_ok();
            mutex.close().expect("close mutex");
            acquired
        })
        .join()
        .unwrap();
        assert!(acquired, "mutex still held after close");
    }

    #[test]
    fn dropping_objects_releases_a_held_mutex() {
        let fixture = EngineFixture::create();
        let mut objects = Win32Backend.open(&fixture.names, MEMORY_SIZE).unwrap();
        objects.lock(None).unwrap();
        drop(objects);

        let mutex_name = fixture.names.mutex.clone();
        let acquired = thread::spawn(move || {
            let mut mutex = NamedMutex::open(&mutex_name).expect("open mutex");
            mutex.acquire(Some(Duration::from_millis(100))).is_ok()
        })
        .join()
        .unwrap();
        assert!(acquired, "mutex still held after drop");
    }
}
