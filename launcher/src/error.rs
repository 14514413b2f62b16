//! Error types for the sidecar launcher.
//!
//! The variants follow the failure taxonomy of the export action: packaging
//! defects are fatal build errors, filesystem and spawn failures are reported
//! to the user and abort the action. An integrity mismatch is not an error at
//! all; the cache repairs itself.

use std::path::PathBuf;
use thiserror::Error;

use crate::extraction::ExtractionError;

/// Coarse classification of a [`LauncherError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The embedded payload or digest is missing or inconsistent.
    PackagingDefect,
    /// Creating, deleting, or writing files failed.
    Filesystem,
    /// The operating system refused to create the child process.
    Spawn,
}

/// Errors that can occur while preparing or launching the sidecar.
#[derive(Debug, Error)]
pub enum LauncherError {
    /// The embedded payload or its reference digest is missing or unusable.
    #[error("packaging defect: {reason}")]
    PackagingDefect {
        /// Description of what is wrong with the payload.
        reason: String,
    },

    /// A filesystem operation on the cache failed.
    #[error("failed to {operation} {path}")]
    Filesystem {
        /// The operation that failed, phrased as a verb.
        operation: &'static str,
        /// The path the operation was applied to.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The shared data directory could not be determined.
    #[error("could not determine the shared data directory: {reason}")]
    DataDirUnavailable {
        /// Why the directory is unavailable.
        reason: String,
    },

    /// Spawning the sidecar executable failed.
    #[error("failed to start {path}")]
    Spawn {
        /// The executable that could not be started.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl LauncherError {
    /// Build a [`LauncherError::Filesystem`] for `operation` on `path`.
    pub(crate) fn filesystem(
        operation: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Filesystem {
            operation,
            path,
            source,
        }
    }

    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PackagingDefect { .. } => ErrorKind::PackagingDefect,
            Self::Filesystem { .. } | Self::DataDirUnavailable { .. } => ErrorKind::Filesystem,
            Self::Spawn { .. } => ErrorKind::Spawn,
        }
    }

    /// Map an extraction failure into the launcher taxonomy.
    ///
    /// I/O failures are filesystem errors; a malformed archive can only come
    /// from a broken build and is a packaging defect.
    pub(crate) fn from_extraction(dest: impl Into<PathBuf>, err: ExtractionError) -> Self {
        match err {
            ExtractionError::Io(source) => Self::Filesystem {
                operation: "extract payload into",
                path: dest.into(),
                source,
            },
            other => Self::PackagingDefect {
                reason: other.to_string(),
            },
        }
    }
}

/// A launcher failure tagged with the user action it aborted.
///
/// The display text names the action so the notification shown to the user
/// says what failed, not just why.
#[derive(Debug, Error)]
#[error("{action} failed: {source}")]
pub struct ActionError {
    /// Display name of the aborted action.
    pub action: String,
    /// The underlying failure.
    #[source]
    pub source: LauncherError,
}

/// Result type alias using [`LauncherError`].
pub type Result<T> = std::result::Result<T, LauncherError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn filesystem_error_names_operation_and_path() {
        let err = LauncherError::filesystem("remove", "/tmp/cache/Delivery")(
            std::io::Error::other("permission denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("remove"));
        assert!(msg.contains("/tmp/cache/Delivery"));
        assert!(err.source().is_some());
        assert_eq!(err.kind(), ErrorKind::Filesystem);
    }

    #[test]
    fn extraction_io_errors_are_filesystem_failures() {
        let err = LauncherError::from_extraction(
            "/tmp/stage",
            ExtractionError::Io(std::io::Error::other("disk full")),
        );
        assert_eq!(err.kind(), ErrorKind::Filesystem);
    }

    #[test]
    fn malformed_archives_are_packaging_defects() {
        let err = LauncherError::from_extraction("/tmp/stage", ExtractionError::EmptyArchive);
        assert_eq!(err.kind(), ErrorKind::PackagingDefect);
    }

    #[test]
    fn action_error_names_the_action() {
        let err = ActionError {
            action: "Export Table To Excel".to_owned(),
            source: LauncherError::Spawn {
                path: PathBuf::from("/opt/tagsheet-export"),
                source: std::io::Error::other("not found"),
            },
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Export Table To Excel failed"));
        assert!(msg.contains("/opt/tagsheet-export"));
    }
}
