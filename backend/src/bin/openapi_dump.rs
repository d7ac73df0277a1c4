//! Print the OpenAPI document for client generation and review.

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use student_records::ApiDoc;
use utoipa::OpenApi;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Format {
    #[default]
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(about = "Print the student records OpenAPI document")]
struct Args {
    /// Output format.
    #[arg(long, value_enum, default_value_t)]
    format: Format,
}

fn render(format: Format) -> Result<String, String> {
    let doc = ApiDoc::openapi();
    match format {
        Format::Json => doc.to_pretty_json().map_err(|err| err.to_string()),
        Format::Yaml => doc.to_yaml().map_err(|err| err.to_string()),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match render(args.format) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to render OpenAPI document: {err}");
            ExitCode::FAILURE
        }
    }
}
