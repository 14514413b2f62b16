//! The sidecar payload compiled into the launcher.
//!
//! The payload is a zip archive holding `Delivery/<sidecar executable>` and a
//! companion text file with the executable's SHA-256 digest. Both are
//! produced by `tagsheet-package-payload` and embedded by the build script.
//! They are never modified at run time.

use crate::digest::Sha256Digest;
use crate::error::{LauncherError, Result};

/// Name of the directory inside the archive, and inside the cache, that holds
/// the sidecar executable.
pub const DELIVERY_DIR: &str = "Delivery";

/// Base name of the sidecar executable, without platform suffix.
pub const SIDECAR_NAME: &str = "tagsheet-export";

static BUNDLED_ARCHIVE: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/payload.zip"));
static BUNDLED_DIGEST: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/payload.sha256"));

/// Return the sidecar executable file name for the current platform.
#[must_use]
pub fn sidecar_file_name() -> String {
    format!("{SIDECAR_NAME}{}", std::env::consts::EXE_SUFFIX)
}

/// An immutable archive and the reference digest of the executable inside.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedPayload<'a> {
    archive: &'a [u8],
    digest: &'a [u8],
}

impl<'a> EmbeddedPayload<'a> {
    /// Wrap an archive and the raw text of its reference digest.
    #[must_use]
    pub const fn new(archive: &'a [u8], digest: &'a [u8]) -> Self {
        Self { archive, digest }
    }

    /// Return the archive bytes.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError::PackagingDefect`] when the archive is empty,
    /// which means the launcher was built without a payload.
    pub fn archive(&self) -> Result<&'a [u8]> {
        if self.archive.is_empty() {
            return Err(LauncherError::PackagingDefect {
                reason: "no sidecar payload archive was embedded at build time".to_owned(),
            });
        }
        Ok(self.archive)
    }

    /// Parse the reference digest.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError::PackagingDefect`] when the digest is missing,
    /// not UTF-8, or not a SHA-256 hex string.
    pub fn reference_digest(&self) -> Result<Sha256Digest> {
        let text = std::str::from_utf8(self.digest).map_err(|_| {
            LauncherError::PackagingDefect {
                reason: "embedded reference digest is not UTF-8".to_owned(),
            }
        })?;
        if text.trim().is_empty() {
            return Err(LauncherError::PackagingDefect {
                reason: "no reference digest was embedded at build time".to_owned(),
            });
        }
        Sha256Digest::parse_reference(text).map_err(|err| LauncherError::PackagingDefect {
            reason: format!("embedded reference digest is unusable: {err}"),
        })
    }
}

impl EmbeddedPayload<'static> {
    /// Return the payload embedded by the build script.
    #[must_use]
    pub fn bundled() -> Self {
        Self::new(BUNDLED_ARCHIVE, BUNDLED_DIGEST)
    }
}
