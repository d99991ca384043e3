use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::BytesMut;
use c2eprims_frame::{Dialect, Response, SOCKET_TRAILER};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{close_on_drop, finish_request, CaosInterface};

/// Port socket engines listen on by default.
pub const DEFAULT_PORT: u16 = 20001;

/// Host socket engines listen on by default.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bound on connect, each write, and each read.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);

const READ_CHUNK_SIZE: usize = 1024;

/// Configuration for a socket connection.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    pub host: String,
    pub port: u16,
    /// Bound on connect and on every read and write. `None` blocks forever,
    /// and so does a zero duration.
    pub timeout: Option<Duration>,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl SocketConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// The timeout sockets are given. Zero is not a valid socket timeout,
    /// so it is read as no limit.
    pub fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|timeout| !timeout.is_zero())
    }

    /// Whether the engine is on another machine.
    pub fn is_remote(&self) -> bool {
        !matches!(self.host.as_str(), "127.0.0.1" | "localhost" | "::1")
    }
}

/// Socket interface to an engine (Linux c2e, openc2e).
///
/// The engine runs whatever it reads once it sees `rscr`, writes the output,
/// and hangs up, so each request uses a fresh connection.
pub struct SocketInterface {
    config: SocketConfig,
    target: String,
    stream: Option<TcpStream>,
}

impl SocketInterface {
    pub fn new(config: SocketConfig) -> Self {
        let target = format!("{}:{}", config.host, config.port);
        Self {
            config,
            target,
            stream: None,
        }
    }

    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    fn open_stream(&self) -> std::io::Result<TcpStream> {
        let addrs: Vec<SocketAddr> = (self.config.host.as_str(), self.config.port)
            .to_socket_addrs()?
            .collect();

        let timeout = self.config.effective_timeout();
        let mut last_err = None;
        for addr in addrs {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_read_timeout(timeout)?;
                    stream.set_write_timeout(timeout)?;
                    return Ok(stream);
                }
                Err(err) => {
                    debug!(%addr, error = %err, "engine address refused connection");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            std::io::Error::new(ErrorKind::NotFound, "host resolved to no addresses")
        }))
    }

    /// Write the request and read until the engine hangs up.
    fn exchange(&mut self, payload: &[u8]) -> Result<Response> {
        let timeout = self.config.effective_timeout();
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| TransportError::NotConnected(self.target.clone()))?;

        stream
            .write_all(payload)
            .and_then(|()| stream.write_all(SOCKET_TRAILER))
            .and_then(|()| stream.flush())
            .map_err(|err| TransportError::from_stream_io(err, "socket write", timeout))?;

        let mut data = BytesMut::with_capacity(READ_CHUNK_SIZE);
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            let read = match stream.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::from_stream_io(err, "socket read", timeout)),
            };
            if read == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..read]);
        }

        debug!(engine = %self.target, size = data.len(), "read socket response");
        Ok(Response::new(data.freeze()))
    }
}

impl CaosInterface for SocketInterface {
    fn target(&self) -> &str {
        &self.target
    }

    fn dialect(&self) -> Dialect {
        Dialect::Socket
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn connect_body(&mut self) -> Result<()> {
        let stream = self.open_stream().map_err(|source| TransportError::Connect {
            target: self.target.clone(),
            source,
        })?;
        self.stream = Some(stream);
        Ok(())
    }

    fn disconnect_body(&mut self) -> Result<()> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        match stream.shutdown(Shutdown::Both) {
            // The engine usually hangs up first.
            Err(err) if err.kind() != ErrorKind::NotConnected => Err(TransportError::Disconnect {
                target: self.target.clone(),
                source: err,
            }),
            _ => Ok(()),
        }
    }

    fn raw_request(&mut self, payload: &[u8]) -> Result<Response> {
        if !self.is_connected() {
            self.connect()?;
        }
        debug!(engine = %self.target, size = payload.len(), "socket request");
        let outcome = self.exchange(payload);
        finish_request(self, outcome)
    }
}

impl Drop for SocketInterface {
    fn drop(&mut self) {
        close_on_drop(self);
    }
}
