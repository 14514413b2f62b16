//! Verified sidecar launcher for the tag table export add-in.
//!
//! The add-in runs inside a permission-restricted host and cannot do the
//! export itself. Instead it delegates to a separately packaged sidecar
//! executable that is compiled into the launcher as a zip payload, cached on
//! disk, verified against a SHA-256 reference digest on every use, and
//! started as a detached process.
//!
//! # Modules
//!
//! - [`action`] - The "Export To Excel" menu actions
//! - [`cache`] - Verified extraction of the sidecar into the shared cache
//! - [`cli`] - Command-line argument definitions
//! - [`digest`] - SHA-256 integrity checks
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Semantic error types
//! - [`extraction`] - Zip extraction with traversal protection
//! - [`layout`] - Cache path layout derived from package metadata
//! - [`output`] - User-facing failure reporting
//! - [`packaging`] - Build-time payload packaging
//! - [`payload`] - The payload embedded at build time
//! - [`spawn`] - Detached process launching

pub mod action;
pub mod cache;
pub mod cli;
pub mod digest;
pub mod dirs;
pub mod error;
pub mod extraction;
pub mod layout;
pub mod output;
pub mod packaging;
pub mod payload;
pub mod spawn;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
