//! Packaging binary for the sidecar payload.
//!
//! Thin CLI wrapper around [`tagsheet_launcher::packaging`]. Its outputs are
//! fed to the launcher build through `TAGSHEET_PAYLOAD_ARCHIVE` and
//! `TAGSHEET_PAYLOAD_DIGEST`.

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tagsheet_launcher::output::write_stderr_line;
use tagsheet_launcher::packaging::{PackagingError, create_payload};

/// Package the sidecar executable into an embeddable payload.
#[derive(Parser, Debug)]
#[command(name = "tagsheet-package-payload")]
#[command(version, about = "Package the sidecar executable into an embeddable payload")]
struct PackageCli {
    /// Path to the built sidecar executable.
    #[arg(long)]
    executable: PathBuf,

    /// Directory where the archive and digest file are written.
    #[arg(long)]
    output_dir: PathBuf,
}

fn main() {
    let cli = PackageCli::parse();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    if let Err(err) = run(&cli, &mut stdout) {
        write_stderr_line(&mut stderr, format!("error: {err}"));
        std::process::exit(1);
    }
}

fn run(cli: &PackageCli, stdout: &mut dyn Write) -> Result<(), PackagingError> {
    let output = create_payload(&cli.executable, &cli.output_dir)?;
    writeln!(stdout, "Created {}", output.archive_path.display())?;
    writeln!(stdout, "Digest  {}", output.digest_path.display())?;
    Ok(())
}
