use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use c2eprims_frame::CaosInput;
use c2eprims_transport::{InterfaceKind, InterfaceOptions};
use clap::{Args, Subcommand};

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod add_script;
pub mod execute;
pub mod ping;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run CAOS on the engine and print its output.
    Execute(ExecuteArgs),
    /// Install an event script into the engine's scriptorium.
    AddScript(AddScriptArgs),
    /// Check that the engine answers CAOS.
    Ping,
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Execute(args) => execute::run(args, connection, format),
        Command::AddScript(args) => add_script::run(args, connection, format),
        Command::Ping => ping::run(connection, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where the engine is and how long to wait for it.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Interface kind: socket or shared-memory. Default depends on the platform.
    #[arg(long, value_name = "KIND", global = true)]
    pub kind: Option<InterfaceKind>,

    /// Game name the engine registered its shared memory objects under.
    #[arg(
        long,
        value_name = "NAME",
        env = "C2E_GAME_NAME",
        default_value = "Docking Station",
        global = true
    )]
    pub game_name: String,

    /// Engine host for the socket interface.
    #[arg(long, value_name = "HOST", env = "C2E_HOST", default_value = "127.0.0.1", global = true)]
    pub host: String,

    /// Engine port for the socket interface.
    #[arg(long, value_name = "PORT", env = "C2E_PORT", default_value_t = 20001, global = true)]
    pub port: u16,

    /// Request timeout (e.g. 200ms, 2s, none). Default: 200ms for socket, none for shared memory.
    #[arg(long, value_name = "DURATION", global = true)]
    pub timeout: Option<String>,

    /// Bytes of the engine's shared memory buffer to map.
    #[arg(long, value_name = "BYTES", default_value_t = 1024 * 1024, global = true)]
    pub memory_size: usize,

    /// Do not watch the engine process while waiting for a reply.
    #[arg(long, global = true)]
    pub no_process_check: bool,
}

impl ConnectionArgs {
    pub fn kind(&self) -> InterfaceKind {
        self.kind.unwrap_or_else(InterfaceKind::default_for_platform)
    }

    pub fn options(&self) -> CliResult<InterfaceOptions> {
        let kind = self.kind();
        let timeout = match &self.timeout {
            Some(raw) => parse_timeout(raw)?,
            None => match kind {
                InterfaceKind::Socket => InterfaceOptions::default().timeout,
                InterfaceKind::SharedMemory => None,
            },
        };
        Ok(InterfaceOptions {
            game_name: self.game_name.clone(),
            host: self.host.clone(),
            port: self.port,
            timeout,
            memory_size: self.memory_size,
            require_process_access: !self.no_process_check,
        })
    }
}

/// Where CAOS text comes from. Stdin when neither flag is given.
#[derive(Args, Debug, Default)]
pub struct CaosSource {
    /// CAOS to send.
    #[arg(long, conflicts_with = "file")]
    pub caos: Option<String>,
    /// Read CAOS from a file, sent byte for byte.
    #[arg(long, conflicts_with = "caos")]
    pub file: Option<PathBuf>,
}

/// CAOS ready to send: typed text still needs Latin-1 encoding, file and
/// stdin contents go out as read.
pub enum CaosBody {
    Text(String),
    Bytes(Vec<u8>),
}

impl CaosSource {
    pub fn read(&self) -> CliResult<CaosBody> {
        if let Some(caos) = &self.caos {
            return Ok(CaosBody::Text(caos.clone()));
        }
        if let Some(path) = &self.file {
            return fs::read(path)
                .map(CaosBody::Bytes)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
        }
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .map_err(|err| io_error("failed reading stdin", err))?;
        Ok(CaosBody::Bytes(buf))
    }
}

impl CaosBody {
    pub fn input(&self) -> CaosInput<'_> {
        match self {
            CaosBody::Text(text) => CaosInput::Text(text),
            CaosBody::Bytes(bytes) => CaosInput::Bytes(bytes),
        }
    }
}

#[derive(Args, Debug)]
pub struct ExecuteArgs {
    #[command(flatten)]
    pub source: CaosSource,
}

#[derive(Args, Debug)]
pub struct AddScriptArgs {
    #[arg(long)]
    pub family: u32,
    #[arg(long)]
    pub genus: u32,
    #[arg(long)]
    pub species: u32,
    #[arg(long)]
    pub event: u32,
    #[command(flatten)]
    pub source: CaosSource,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `200ms`, `2s`, a bare number of seconds, or `none`.
pub fn parse_timeout(input: &str) -> CliResult<Option<Duration>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }
    if input.eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    Ok(Some(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    }))
}
