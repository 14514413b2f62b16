//! Registry-driven resolution of the vendor engineering API library.
//!
//! The vendor installs one key per product version, each holding one key per
//! public API revision, each mapping library simple names to files on disk.
//! This crate walks that hierarchy, picks the newest product and the newest
//! API revision, and loads the library it names.
//!
//! # Modules
//!
//! - [`version`] - Dotted numeric versions and their total ordering
//! - [`store`] - Read-only hierarchical key/value stores
//! - [`locator`] - Two-level newest-version resolution
//! - [`loader`] - Dynamic library loading
//! - [`chain`] - Explicit resolver registration with a default fallback
//! - [`error`] - Error types for the modules above

pub mod chain;
pub mod error;
pub mod loader;
pub mod locator;
pub mod store;
pub mod version;

pub use chain::ResolverChain;
pub use locator::{DependencyLocator, Miss, simple_name};
pub use store::{KeyVersionStore, MemoryKeyStore, TomlKeyStore};
pub use version::Version;
