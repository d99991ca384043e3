use c2eprims_transport::open_interface;

use crate::cmd::{ConnectionArgs, ExecuteArgs};
use crate::exit::{response_code, transport_error, CliResult};
use crate::output::{print_response, OutputFormat};

pub fn run(args: ExecuteArgs, connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    let kind = connection.kind();
    let options = connection.options()?;
    let body = args.source.read()?;

    let mut interface =
        open_interface(kind, &options).map_err(|err| transport_error("open failed", err))?;
    let response = interface
        .execute(body.input())
        .map_err(|err| transport_error("execute failed", err))?;

    print_response(&response, kind, interface.target(), format);
    Ok(response_code(&response))
}
