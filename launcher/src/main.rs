//! Launcher CLI entrypoint.
//!
//! Runs one export action: verify or refresh the cached sidecar, start it,
//! and optionally wait for it to finish.

use clap::Parser;
use log::info;
use std::io::Write;
use tagsheet_launcher::action::{ActionContext, run_export};
use tagsheet_launcher::cli::Cli;
use tagsheet_launcher::dirs::{BaseDirs, FixedBaseDirs, SystemBaseDirs};
use tagsheet_launcher::error::ActionError;
use tagsheet_launcher::extraction::ZipExtractor;
use tagsheet_launcher::layout::{CacheLayout, ProductIdentity};
use tagsheet_launcher::output::{failure_notification, write_stderr_line};
use tagsheet_launcher::payload::EmbeddedPayload;
use tagsheet_launcher::spawn::SystemSpawner;

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<(), ActionError> {
    let target = cli.target();
    let dirs: Box<dyn BaseDirs> = match &cli.data_root {
        Some(root) => Box::new(FixedBaseDirs(root.clone().into_std_path_buf())),
        None => Box::new(SystemBaseDirs),
    };
    let layout = CacheLayout::for_sidecar(dirs.as_ref(), &ProductIdentity::from_package())
        .map_err(|source| ActionError {
            action: target.action_name().to_owned(),
            source,
        })?;

    let context = ActionContext {
        payload: EmbeddedPayload::bundled(),
        layout: &layout,
        extractor: &ZipExtractor,
        spawner: &SystemSpawner,
    };
    let mut process = run_export(&context, &target)?;

    if !cli.quiet {
        write_stderr_line(
            stderr,
            format!("{} started (process {}).", target.action_name(), process.id()),
        );
    }

    if let Some(timeout) = cli.wait_timeout() {
        match process.wait_timeout(timeout) {
            Ok(Some(status)) => write_stderr_line(stderr, format!("Sidecar exited with {status}.")),
            Ok(None) => write_stderr_line(
                stderr,
                format!("Sidecar still running after {}s.", timeout.as_secs()),
            ),
            Err(err) => write_stderr_line(stderr, format!("Could not wait for sidecar: {err}")),
        }
    }
    info!("launcher finished");
    Ok(())
}

fn exit_code_for_run_result(result: Result<(), ActionError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, failure_notification(&err));
            1
        }
    }
}
