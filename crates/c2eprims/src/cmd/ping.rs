use std::time::Instant;

use c2eprims_transport::open_interface;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use crate::cmd::ConnectionArgs;
use crate::exit::{transport_error, CliResult, FAILURE, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct PingOutput<'a> {
    kind: &'static str,
    target: &'a str,
    ok: bool,
    latency_ms: f64,
}

pub fn run(connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    let kind = connection.kind();
    let options = connection.options()?;

    let mut interface =
        open_interface(kind, &options).map_err(|err| transport_error("open failed", err))?;
    let started = Instant::now();
    let ok = interface
        .test_connection()
        .map_err(|err| transport_error("ping failed", err))?;
    let latency_ms = (started.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0;

    print_ping(
        &PingOutput {
            kind: kind.name(),
            target: interface.target(),
            ok,
            latency_ms,
        },
        format,
    );

    Ok(if ok { SUCCESS } else { FAILURE })
}

fn print_ping(out: &PingOutput<'_>, format: OutputFormat) {
    let status = if out.ok { "ok" } else { "mismatch" };
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "ENGINE", "STATUS", "LATENCY (ms)"])
                .add_row(vec![
                    out.kind.to_string(),
                    out.target.to_string(),
                    status.to_string(),
                    format!("{:.2}", out.latency_ms),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!(
                "{} {} {status} ({:.2} ms)",
                out.kind, out.target, out.latency_ms
            );
        }
    }
}
