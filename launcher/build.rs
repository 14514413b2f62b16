//! Build script for `tagsheet-launcher`.
//!
//! Copies the sidecar payload archive and its reference digest into
//! `OUT_DIR` so the launcher can embed them with `include_bytes!`. The
//! payload is produced by `tagsheet-package-payload` and selected with:
//!
//! - `TAGSHEET_PAYLOAD_ARCHIVE`: path to the payload `.zip`
//! - `TAGSHEET_PAYLOAD_DIGEST`: path to the companion `.sha256` file
//!
//! When either variable is unset, empty placeholders are embedded and the
//! launcher reports a packaging defect at run time.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const ARCHIVE_VAR: &str = "TAGSHEET_PAYLOAD_ARCHIVE";
const DIGEST_VAR: &str = "TAGSHEET_PAYLOAD_DIGEST";

fn main() -> std::io::Result<()> {
    println!("cargo:rerun-if-env-changed={ARCHIVE_VAR}");
    println!("cargo:rerun-if-env-changed={DIGEST_VAR}");

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").unwrap_or_default());
    embed(ARCHIVE_VAR, &out_dir.join("payload.zip"))?;
    embed(DIGEST_VAR, &out_dir.join("payload.sha256"))?;
    Ok(())
}

fn embed(var: &str, dest: &Path) -> std::io::Result<()> {
    match env::var_os(var) {
        Some(source) => {
            let source = PathBuf::from(source);
            println!("cargo:rerun-if-changed={}", source.display());
            fs::copy(&source, dest).map(|_| ())
        }
        None => fs::write(dest, b""),
    }
}
