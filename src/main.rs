//! Export sidecar entrypoint.
//!
//! Loads the configuration, builds the export session from the optional
//! table argument, and runs the export.

use clap::Parser;
use std::io::Write;
use tagsheet::cli::Cli;
use tagsheet::config::ExportConfig;
use tagsheet::error::ExportError;
use tagsheet::export::run_export;
use tagsheet::output::{error_report, write_stderr_line};
use tagsheet::session::ExportSession;

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let mut stderr = std::io::stderr();
    let exit_code = exit_code_for_run_result(run(&cli), &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli) -> Result<(), ExportError> {
    let config = ExportConfig::load(cli.config.as_deref())?;
    let session = ExportSession::new(cli.scope(), config);
    log::debug!("exporting {:?} to {}", session.scope(), session.output_path());
    run_export(&session)
}

fn exit_code_for_run_result(result: Result<(), ExportError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, error_report(&err));
            1
        }
    }
}
