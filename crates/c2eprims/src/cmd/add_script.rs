use c2eprims_frame::ScriptClassifier;
use c2eprims_transport::open_interface;

use crate::cmd::{AddScriptArgs, ConnectionArgs};
use crate::exit::{response_code, transport_error, CliResult};
use crate::output::{print_response, OutputFormat};

pub fn run(
    args: AddScriptArgs,
    connection: &ConnectionArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let kind = connection.kind();
    let options = connection.options()?;
    let classifier = ScriptClassifier::new(args.family, args.genus, args.species, args.event);
    let body = args.source.read()?;

    let mut interface =
        open_interface(kind, &options).map_err(|err| transport_error("open failed", err))?;
    tracing::debug!(%classifier, "installing event script");
    let response = interface
        .add_script(body.input(), classifier)
        .map_err(|err| transport_error("add-script failed", err))?;

    print_response(&response, kind, interface.target(), format);
    Ok(response_code(&response))
}
