//! Payload archive extraction.
//!
//! Extracts `.zip` payloads to a target directory with path traversal
//! protection to prevent zip-slip attacks. Unix permission bits recorded in
//! the archive are restored so the sidecar stays executable.

use std::fs;
use std::io;
use std::path::{Component, Path};

/// Trait for extracting payload archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use tagsheet_launcher::extraction::ZipExtractor;
///
/// let extractor = ZipExtractor;
/// // Use extractor.extract(archive_path, dest_dir) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the archive-relative paths of the extracted files.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry
    /// attempts to escape the destination directory.
    /// Returns [`ExtractionError::EmptyArchive`] if no files are found.
    /// Returns [`ExtractionError::Archive`] if the archive is malformed.
    /// Returns [`ExtractionError::Io`] on I/O failures.
    fn extract(&self, archive_path: &Path, dest_dir: &Path)
    -> Result<Vec<String>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive could not be read as a zip file.
    #[error("malformed payload archive: {0}")]
    Archive(zip::result::ZipError),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no files.
    #[error("payload archive contains no files")]
    EmptyArchive,
}

/// Default extractor using the `zip` crate.
///
/// Validates each entry path before extraction to guard against
/// path traversal attacks (zip-slip).
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<String>, ExtractionError> {
        let file = fs::File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(file).map_err(classify_zip_error)?;
        let mut extracted = Vec::new();

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(classify_zip_error)?;
            let entry_name = entry.name().to_owned();
            let entry_path = entry
                .enclosed_name()
                .ok_or_else(|| ExtractionError::PathTraversal {
                    path: entry_name.clone(),
                })?;
            validate_entry_path(&entry_path)?;

            let dest_path = dest_dir.join(&entry_path);
            if entry.is_dir() {
                fs::create_dir_all(&dest_path)?;
                continue;
            }
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut output = fs::File::create(&dest_path)?;
            io::copy(&mut entry, &mut output)?;
            restore_permissions(&dest_path, entry.unix_mode())?;

            extracted.push(entry_name);
        }

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }

        Ok(extracted)
    }
}

/// Keep I/O failures distinguishable from malformed archives.
fn classify_zip_error(err: zip::result::ZipError) -> ExtractionError {
    match err {
        zip::result::ZipError::Io(source) => ExtractionError::Io(source),
        other => ExtractionError::Archive(other),
    }
}

#[cfg(unix)]
fn restore_permissions(path: &Path, mode: Option<u32>) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match mode {
        Some(mode) => fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777)),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn restore_permissions(_path: &Path, _mode: Option<u32>) -> io::Result<()> {
    Ok(())
}

/// Validate that an archive entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}
