//! The delegated export sidecar.
//!
//! The launcher starts `tagsheet-export` outside the host's restricted
//! process. The sidecar registers the registry-driven resolver for the
//! vendor engineering API, loads it, and calls its export entry point for
//! one tag table or for all of them.
//!
//! # Modules
//!
//! - [`cli`] - Command-line arguments
//! - [`config`] - `tagsheet.toml` loading and defaults
//! - [`session`] - The explicit export session and output preparation
//! - [`export`] - Resolve-then-call of the vendor library
//! - [`output`] - Error reporting on stderr
//! - [`error`] - Error types for the modules above

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod output;
pub mod session;

pub use config::ExportConfig;
pub use session::{ExportScope, ExportSession};
