#![deny(missing_docs)]

//! # API Gateway OpenAPI CLI
//!
//! Prints `{"integrated_openapi_yaml": "<yaml>"}` on stdout, the shape
//! expected by Terraform's `external` data source.
//!
//! Exit codes:
//! - `0`: success, or `--help` / `--version`.
//! - `1`: the document could not be read, parsed or written.
//! - `2`: bad flags or missing `--input`.
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `warn`).

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

mod integrate;

const USAGE_EXIT_CODE: u8 = 2;

#[derive(Parser, Debug)]
#[clap(
    name = "openapi-integration",
    author,
    version,
    args_override_self = true,
    about = "Injects API Gateway HTTP-proxy integrations into an OpenAPI document"
)]
struct Cli {
    #[clap(flatten)]
    args: integrate::IntegrateArgs,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return report_parse_error(&err),
    };

    init_tracing();

    let Some(input) = cli.args.input_path() else {
        print_usage();
        return ExitCode::from(USAGE_EXIT_CODE);
    };

    match integrate::execute(&cli.args, input) {
        Ok(envelope) => {
            println!("{}", envelope);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn report_parse_error(err: &clap::Error) -> ExitCode {
    // Help and version render to stdout, diagnostics to stderr.
    if err.print().is_err() {
        eprintln!("{}", err);
    }

    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
        _ => {
            print_usage();
            ExitCode::from(USAGE_EXIT_CODE)
        }
    }
}

fn print_usage() {
    println!("{}", Cli::command().render_usage());
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    if subscriber.try_init().is_err() {
        tracing::warn!("tracing subscriber already initialised");
    }
}
