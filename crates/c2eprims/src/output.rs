use std::io::{IsTerminal, Write};

use c2eprims_frame::Response;
use c2eprims_transport::InterfaceKind;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Raw
        }
    }
}

#[derive(Serialize)]
struct ResponseOutput<'a> {
    kind: &'static str,
    engine: &'a str,
    size: usize,
    declared_length: Option<usize>,
    error: Option<bool>,
    text: String,
}

pub fn print_response(response: &Response, kind: InterfaceKind, engine: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ResponseOutput {
                kind: kind.name(),
                engine,
                size: response.data().len(),
                declared_length: response.declared_length(),
                error: response.error(),
                text: response.text(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ENGINE", "SIZE", "ERROR", "OUTPUT"])
                .add_row(vec![
                    engine.to_string(),
                    response.data().len().to_string(),
                    error_label(response.error()).to_string(),
                    response.text(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let text = response.text();
            if response.error() == Some(true) {
                eprintln!("engine reported an error:");
            }
            if text.ends_with('\n') || text.is_empty() {
                print!("{text}");
            } else {
                println!("{text}");
            }
        }
        OutputFormat::Raw => print_raw(response.text_bytes()),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn error_label(error: Option<bool>) -> &'static str {
    match error {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}
