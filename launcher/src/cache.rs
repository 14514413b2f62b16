//! Verified on-disk cache of the sidecar executable.
//!
//! [`ResourceCache::ensure`] guarantees that, when it returns, the executable
//! at the layout's target path hashes to the embedded reference digest.
//! Validity is recomputed on every call. A stale or tampered cache is never
//! patched in place: the whole delivery directory is removed and a fresh copy
//! is staged in a sibling temporary directory, verified, and renamed into
//! place.

use camino::Utf8PathBuf;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::digest::{self, Sha256Digest};
use crate::error::{LauncherError, Result};
use crate::extraction::ArchiveExtractor;
use crate::layout::CacheLayout;
use crate::payload::{DELIVERY_DIR, EmbeddedPayload};

/// Prefix of the staging directories created inside the product directory.
const STAGING_PREFIX: &str = ".staging-";

/// File name of the temporary archive copy written during extraction.
const STAGED_ARCHIVE_NAME: &str = "payload.zip";

/// Staging directories untouched for this long belong to an interrupted
/// extraction, not to a launcher still at work.
const STALE_STAGING_AGE: Duration = Duration::from_secs(10 * 60);

/// Ensures the sidecar executable is present and verified.
pub struct ResourceCache<'a> {
    extractor: &'a dyn ArchiveExtractor,
}

impl<'a> ResourceCache<'a> {
    /// Create a cache that extracts payloads with `extractor`.
    #[must_use]
    pub const fn new(extractor: &'a dyn ArchiveExtractor) -> Self {
        Self { extractor }
    }

    /// Return the path of a verified sidecar executable, extracting the
    /// payload first when the cache is missing or stale.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError::PackagingDefect`] when the payload or digest
    /// is missing, the archive is malformed, or the freshly extracted
    /// executable does not match the digest. Returns
    /// [`LauncherError::Filesystem`] when deleting, creating or writing cache
    /// files fails. A cached copy that cannot be verified is replaced rather
    /// than reported.
    pub fn ensure(
        &self,
        payload: &EmbeddedPayload<'_>,
        layout: &CacheLayout,
    ) -> Result<Utf8PathBuf> {
        let reference = payload.reference_digest()?;
        let target = layout.executable_path();

        if cached_copy_is_valid(target.as_std_path(), &reference) {
            debug!("cached sidecar at {target} is valid");
            return Ok(target);
        }

        discard_delivery(layout)?;
        self.populate(payload.archive()?, &reference, layout)?;
        info!("extracted sidecar to {target}");
        Ok(target)
    }

    fn populate(
        &self,
        archive: &[u8],
        reference: &Sha256Digest,
        layout: &CacheLayout,
    ) -> Result<()> {
        let product_dir = layout.product_dir().as_std_path();
        fs::create_dir_all(product_dir).map_err(LauncherError::filesystem("create", product_dir))?;
        sweep_stale_staging(product_dir, STALE_STAGING_AGE);

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(product_dir)
            .map_err(LauncherError::filesystem(
                "create a staging directory in",
                product_dir,
            ))?;

        let staged_archive = staging.path().join(STAGED_ARCHIVE_NAME);
        fs::write(&staged_archive, archive)
            .map_err(LauncherError::filesystem("write", &staged_archive))?;
        let extracted = self.extractor.extract(&staged_archive, staging.path());
        fs::remove_file(&staged_archive)
            .map_err(LauncherError::filesystem("remove", &staged_archive))?;
        let entries = extracted.map_err(|err| LauncherError::from_extraction(staging.path(), err))?;
        debug!("staged {} payload entries in {}", entries.len(), staging.path().display());

        let staged_delivery = staging.path().join(DELIVERY_DIR);
        let staged_executable = staged_delivery.join(layout.executable_name());
        if !verify(&staged_executable, reference)? {
            return Err(LauncherError::PackagingDefect {
                reason: format!(
                    "payload entry {DELIVERY_DIR}/{} is missing or does not match the reference digest",
                    layout.executable_name()
                ),
            });
        }

        let delivery = layout.delivery_dir();
        if let Err(err) = fs::rename(&staged_delivery, delivery.as_std_path()) {
            // Another launcher may have completed the same extraction first.
            if !verify(layout.executable_path().as_std_path(), reference)? {
                return Err(LauncherError::filesystem("move the staged payload to", delivery)(err));
            }
            debug!("{delivery} was populated concurrently; discarding staged copy");
        }

        if let Err(err) = staging.close() {
            warn!("failed to remove staging directory: {err}");
        }
        Ok(())
    }
}

fn verify(path: &Path, reference: &Sha256Digest) -> Result<bool> {
    digest::matches(path, reference).map_err(LauncherError::filesystem("verify", path))
}

/// Whether the cached executable exists as a regular file matching
/// `reference`. Anything else at the target, including a file that cannot
/// be read, is a stale cache to be replaced.
fn cached_copy_is_valid(target: &Path, reference: &Sha256Digest) -> bool {
    match fs::symlink_metadata(target) {
        Ok(metadata) if metadata.is_file() => {}
        Ok(_) => {
            warn!("{} is not a regular file; replacing the cache", target.display());
            return false;
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => return false,
        Err(err) => {
            warn!("cannot inspect {}: {err}; replacing the cache", target.display());
            return false;
        }
    }
    match digest::matches(target, reference) {
        Ok(valid) => valid,
        Err(err) => {
            warn!("cannot hash {}: {err}; replacing the cache", target.display());
            false
        }
    }
}

/// Remove staging directories left behind by interrupted extractions.
///
/// Directories modified within `min_age` are left alone; another launcher
/// may be extracting into them. Failures are logged and otherwise ignored.
fn sweep_stale_staging(product_dir: &Path, min_age: Duration) {
    let entries = match fs::read_dir(product_dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("cannot list {}: {err}", product_dir.display());
            return;
        }
    };
    let now = SystemTime::now();
    for entry in entries.filter_map(std::result::Result::ok) {
        if !entry.file_name().to_string_lossy().starts_with(STAGING_PREFIX) {
            continue;
        }
        let stale = entry
            .metadata()
            .and_then(|metadata| metadata.modified())
            .is_ok_and(|modified| now.duration_since(modified).is_ok_and(|age| age >= min_age));
        if !stale {
            continue;
        }
        let path = entry.path();
        match fs::remove_dir_all(&path) {
            Ok(()) => debug!("removed abandoned staging directory {}", path.display()),
            Err(err) => warn!("failed to remove abandoned staging directory {}: {err}", path.display()),
        }
    }
}

/// Remove whatever currently occupies the delivery directory.
fn discard_delivery(layout: &CacheLayout) -> Result<()> {
    let delivery = layout.delivery_dir();
    let metadata = match fs::symlink_metadata(&delivery) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(LauncherError::filesystem("inspect", delivery)(err)),
    };

    if layout.executable_path().exists() {
        info!("cached sidecar in {delivery} failed verification; re-extracting");
    } else {
        debug!("{delivery} holds no sidecar executable; re-extracting");
    }

    let removed = if metadata.is_dir() {
        fs::remove_dir_all(&delivery)
    } else {
        fs::remove_file(&delivery)
    };
    removed.map_err(LauncherError::filesystem("remove", delivery))
}
