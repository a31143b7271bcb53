mod commands;

use crate::commands::{handle_connectors, handle_serve, handle_validate, ServeArgs, ValidateArgs};
use clap::{Parser, Subcommand};
use common::error::ValidatorError;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code of `validate` when the configuration is INVALID.
const INVALID_EXIT_CODE: u8 = 2;

#[derive(Parser)]
#[command(name = "connect-validator")]
pub struct Cli {
    #[arg(
        long = "config-path",
        short = 'c',
        help = "path to config file",
        global = true
    )]
    pub config_path: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Serve the validation endpoint
    Serve(ServeArgs),
    /// Validate one configuration file and print the report
    Validate(ValidateArgs),
    /// List the supported connector types
    Connectors,
}

fn report_failure(e: ValidatorError) -> ExitCode {
    tracing::error!("{e}");
    eprintln!("Error: {e}");
    ExitCode::FAILURE
}

#[actix_web::main]
async fn main() -> ExitCode {
    logging::init_logger();
    let cli = Cli::parse();
    let config_path = cli.config_path.as_deref();

    match cli.command {
        Cmd::Serve(args) => match handle_serve(args, config_path).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => report_failure(e),
        },
        Cmd::Validate(args) => match handle_validate(args, config_path).await {
            Ok(report) => {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => return report_failure(ValidatorError::Validate(Box::new(e))),
                }
                if report.is_valid() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(INVALID_EXIT_CODE)
                }
            }
            Err(e) => report_failure(e),
        },
        Cmd::Connectors => match handle_connectors() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => report_failure(e),
        },
    }
}
