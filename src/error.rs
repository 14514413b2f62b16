//! Error types for the export sidecar.

use camino::Utf8PathBuf;
use std::ffi::NulError;
use thiserror::Error;

use tagsheet_locator::error::{LoadError, LocatorError, StoreError};

/// Errors arising from loading `tagsheet.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}")]
    Read {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is malformed.
    #[error("invalid configuration {path}: {source}")]
    Parse {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// The underlying parse error.
        #[source]
        source: Box<toml::de::Error>,
    },
}

/// Errors that abort an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The key store document could not be loaded.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The locator rejected its configuration.
    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// The vendor library could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The loaded library does not export the entry point.
    #[error("library does not export `{symbol}`")]
    Symbol {
        /// The missing symbol name.
        symbol: String,
        /// The underlying loader error.
        #[source]
        source: libloading::Error,
    },

    /// A value passed to the entry point contains an interior NUL byte.
    #[error("cannot pass \"{value}\" to the export entry point")]
    InvalidArgument {
        /// The rejected value.
        value: String,
        /// The underlying conversion error.
        #[source]
        source: NulError,
    },

    /// The previous spreadsheet could not be replaced.
    #[error("close {path} and try again")]
    OutputLocked {
        /// The spreadsheet that could not be removed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The directory for the spreadsheet could not be created.
    #[error("failed to create output directory {path}")]
    OutputDirectory {
        /// The directory that could not be created.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The export entry point reported failure.
    #[error("export failed with status {code}")]
    Failed {
        /// The status returned by the entry point.
        code: i32,
    },
}

/// Convenience alias for export results.
pub type Result<T> = std::result::Result<T, ExportError>;
