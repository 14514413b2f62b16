//! Build-time packaging of the sidecar payload.
//!
//! Produces the two files the launcher's build script embeds: a zip archive
//! holding `Delivery/<executable>` and a companion `.sha256` text file with
//! the executable's digest.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::digest::{Sha256Digest, compute_sha256};
use crate::payload::DELIVERY_DIR;

/// File name of the generated payload archive.
pub const PAYLOAD_ARCHIVE_NAME: &str = "sidecar-payload.zip";

/// Errors arising from payload packaging.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// Reading the executable or writing the outputs failed.
    #[error("I/O error during packaging: {0}")]
    Io(#[from] io::Error),

    /// Writing the zip archive failed.
    #[error("failed to write payload archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The executable path is missing or has no file name.
    #[error("executable not found: {0}")]
    ExecutableNotFound(PathBuf),
}

/// Files produced by [`create_payload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadOutput {
    /// The zip archive.
    pub archive_path: PathBuf,
    /// The companion digest file.
    pub digest_path: PathBuf,
    /// Digest of the packaged executable.
    pub digest: Sha256Digest,
}

/// Package `executable` into `output_dir`.
///
/// The executable keeps its file name inside the archive and is marked
/// executable for Unix extraction.
///
/// # Errors
///
/// Returns [`PackagingError::ExecutableNotFound`] when `executable` is not a
/// regular file, and I/O or archive errors from writing the outputs.
pub fn create_payload(executable: &Path, output_dir: &Path) -> Result<PayloadOutput, PackagingError> {
    let file_name = executable
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|_| executable.is_file())
        .ok_or_else(|| PackagingError::ExecutableNotFound(executable.to_path_buf()))?;

    fs::create_dir_all(output_dir)?;
    let archive_path = output_dir.join(PAYLOAD_ARCHIVE_NAME);
    let digest_path = output_dir.join(format!("{PAYLOAD_ARCHIVE_NAME}.sha256"));

    let mut writer = zip::ZipWriter::new(fs::File::create(&archive_path)?);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    writer.start_file(format!("{DELIVERY_DIR}/{file_name}"), options)?;
    writer.write_all(&fs::read(executable)?)?;
    writer.finish()?;

    let digest = compute_sha256(executable)?;
    fs::write(&digest_path, format!("{digest}\n"))?;

    Ok(PayloadOutput {
        archive_path,
        digest_path,
        digest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{ArchiveExtractor, ZipExtractor};
    use crate::payload::EmbeddedPayload;

    #[test]
    fn payload_round_trips_through_the_extractor() {
        let dir = tempfile::tempdir().expect("temp dir");
        let executable = dir.path().join("tagsheet-export");
        fs::write(&executable, b"sidecar binary").expect("write executable");
        let output_dir = dir.path().join("out");

        let output = create_payload(&executable, &output_dir).expect("package");

        let archive = fs::read(&output.archive_path).expect("read archive");
        let digest_text = fs::read(&output.digest_path).expect("read digest");
        let payload = EmbeddedPayload::new(&archive, &digest_text);
        assert_eq!(payload.reference_digest().expect("digest"), output.digest);

        let unpacked = dir.path().join("unpacked");
        let entries = ZipExtractor
            .extract(&output.archive_path, &unpacked)
            .expect("extract");
        assert_eq!(entries, vec!["Delivery/tagsheet-export"]);
        assert_eq!(
            fs::read(unpacked.join("Delivery").join("tagsheet-export")).expect("read"),
            b"sidecar binary"
        );
    }

    #[test]
    fn missing_executable_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = create_payload(&dir.path().join("absent"), dir.path()).expect_err("missing");
        assert!(matches!(err, PackagingError::ExecutableNotFound(_)));
    }
}
