//! Error types for version parsing, key stores, and library resolution.
//!
//! Resolution misses are deliberately absent from these types: a missing key,
//! value or file is an `Ok(None)` outcome, not an error. The variants below
//! cover malformed input to this crate's own API and failures to read or load
//! something that was found.

use std::path::PathBuf;
use thiserror::Error;

/// Errors arising from parsing or selecting dotted versions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// The version string was empty.
    #[error("version string is empty")]
    Empty,

    /// The version string contains an empty component (`1..2`, `.1`, `1.`).
    #[error("version \"{value}\" contains an empty component")]
    EmptyComponent {
        /// The rejected version string.
        value: String,
    },

    /// A component is not an unsigned integer.
    #[error("version \"{value}\" has non-numeric component \"{component}\"")]
    InvalidComponent {
        /// The rejected version string.
        value: String,
        /// The offending component.
        component: String,
    },

    /// A maximum was requested from an empty set of versions.
    #[error("no versions to choose from")]
    NoCandidates,
}

/// Errors arising from loading a key/value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store file could not be read.
    #[error("failed to read key store {path}")]
    Read {
        /// Path of the store file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The store file is not a valid TOML document.
    #[error("invalid key store {path}: {source}")]
    Parse {
        /// Path of the store file.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: toml::de::Error,
    },
}

/// Errors arising from misuse of the dependency locator itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    /// The locator was constructed with an empty base key path.
    #[error("base key path must not be empty")]
    EmptyBasePath,

    /// An empty identity string was passed for resolution.
    #[error("library identity must not be empty")]
    EmptyIdentity,
}

/// Errors arising from loading a dynamic library.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The operating system loader rejected the library.
    #[error("failed to load library {path}")]
    Library {
        /// Path or name that was passed to the loader.
        path: PathBuf,
        /// The underlying loader error.
        #[source]
        source: libloading::Error,
    },

    /// Every registered resolver missed and the default loader failed too.
    #[error("could not resolve library \"{name}\"")]
    Unresolved {
        /// Simple name of the requested library.
        name: String,
        /// The default loader's own failure.
        #[source]
        source: Box<LoadError>,
    },

    /// The locator rejected its arguments.
    #[error(transparent)]
    Locator(#[from] LocatorError),
}
