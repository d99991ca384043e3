//! Inject CAOS into running Creatures Evolution Engine games.
//!
//! c2eprims talks to a running engine over whichever transport it exposes
//! (a TCP socket on Linux, named shared memory on Windows) and hands back
//! what the engine printed.
//!
//! # Crate Structure
//!
//! - [`transport`]: connection lifecycle, socket and shared memory interfaces
//! - [`frame`]: request framing, text encoding, and response decoding
//!
//! The free functions here are one-shot helpers: each opens the platform's
//! default interface, runs its request(s), and closes it again.
//!
//! ```no_run
//! use c2eprims::transport::InterfaceOptions;
//!
//! let response = c2eprims::execute_caos("outs \"hi\"", &InterfaceOptions::default())?;
//! println!("{}", response.text());
//! # Ok::<(), c2eprims::transport::TransportError>(())
//! ```

/// Re-export transport types.
pub mod transport {
    pub use c2eprims_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use c2eprims_frame::*;
}

use c2eprims_frame::{CaosInput, EventScript, Request, Response};
use c2eprims_transport::{open_interface, CaosInterface, InterfaceKind, InterfaceOptions, Result};

/// Run CAOS once on the engine described by `options`.
pub fn execute_caos<'a>(
    caos: impl Into<CaosInput<'a>>,
    options: &InterfaceOptions,
) -> Result<Response> {
    let mut interface = open_default(options)?;
    let result = interface.execute(caos.into());
    interface.close()?;
    result
}

/// Install one event script on the engine described by `options`.
pub fn add_script(script: &EventScript, options: &InterfaceOptions) -> Result<Response> {
    let mut interface = open_default(options)?;
    let result = interface.request(&Request::AddScript(script.clone()));
    interface.close()?;
    result
}

/// Install several event scripts in order, stopping at the first failure.
pub fn inject_scripts(scripts: &[EventScript], options: &InterfaceOptions) -> Result<Vec<Response>> {
    let mut interface = open_default(options)?;
    let result = inject_scripts_into(&mut interface, scripts);
    interface.close()?;
    result
}

/// Install several event scripts through an already-open interface.
///
/// Responses come back in script order. The first failing script ends the
/// run; the scripts before it stay installed.
pub fn inject_scripts_into<I: CaosInterface + ?Sized>(
    interface: &mut I,
    scripts: &[EventScript],
) -> Result<Vec<Response>> {
    scripts
        .iter()
        .map(|script| interface.request(&Request::AddScript(script.clone())))
        .collect()
}

fn open_default(options: &InterfaceOptions) -> Result<Box<dyn CaosInterface>> {
    open_interface(InterfaceKind::default_for_platform(), options)
}
