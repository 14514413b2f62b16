//! Two-level newest-version resolution of a library identity.
//!
//! The store layout walked here is:
//!
//! ```text
//! <base>\<product version>\PublicAPI\<api revision>
//!     <simple name> = <library path>
//! ```
//!
//! The newest product version is chosen first, then the newest API revision
//! beneath it. Exactly two levels are walked; a store with a third level of
//! versions is not understood.
//!
//! Every way of not finding the library is reported as a [`Miss`], never as
//! an error, so that the caller's default loader gets its turn.

use crate::error::{LoadError, LocatorError, VersionError};
use crate::loader::LibraryLoader;
use crate::store::{KeyVersionStore, join_key};
use crate::version::{Version, highest_named};
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the key between a product version and its API revisions.
pub const PUBLIC_API_KEY: &str = "PublicAPI";

/// Separator between the simple name and the rest of an identity string.
pub const IDENTITY_SEPARATOR: char = ',';

/// Why a resolution attempt found nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Miss {
    /// The identity string has no separator, so no simple name was extracted.
    NoSimpleName,
    /// A key that should list versions has no children.
    NoVersions {
        /// The key that was listed.
        path: String,
    },
    /// A child key could not be parsed as a version.
    MalformedVersion {
        /// The key whose children were parsed.
        path: String,
        /// The parse failure.
        source: VersionError,
    },
    /// The leaf key has no value for the simple name.
    MissingValue {
        /// The leaf key.
        path: String,
        /// The value name that was looked up.
        name: String,
    },
    /// The path named by the store does not exist on disk.
    MissingFile {
        /// The absolute path that was checked.
        path: PathBuf,
    },
}

impl fmt::Display for Miss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSimpleName => write!(f, "identity has no simple name"),
            Self::NoVersions { path } => write!(f, "no version keys under {path}"),
            Self::MalformedVersion { path, source } => {
                write!(f, "malformed version key under {path}: {source}")
            }
            Self::MissingValue { path, name } => write!(f, "no value {name} at {path}"),
            Self::MissingFile { path } => write!(f, "{} does not exist", path.display()),
        }
    }
}

/// Extract the simple name from a library identity.
///
/// The simple name is the text before the first `,`, with surrounding
/// whitespace removed. Identities without a separator have no simple name.
///
/// # Examples
///
/// ```
/// use tagsheet_locator::simple_name;
///
/// assert_eq!(simple_name("Vendor.Api, Version=18.0.0.0"), Some("Vendor.Api"));
/// assert_eq!(simple_name("Vendor.Api"), None);
/// ```
#[must_use]
pub fn simple_name(identity: &str) -> Option<&str> {
    identity
        .split_once(IDENTITY_SEPARATOR)
        .map(|(name, _)| name.trim())
        .filter(|name| !name.is_empty())
}

/// Resolves library identities against a [`KeyVersionStore`].
///
/// The locator keeps no state besides its configuration; every call re-reads
/// the store. It is `Send + Sync` whenever the store is.
#[derive(Debug, Clone)]
pub struct DependencyLocator<S> {
    store: S,
    base_path: String,
}

impl<S: KeyVersionStore> DependencyLocator<S> {
    /// Create a locator rooted at `base_path`.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::EmptyBasePath`] if `base_path` is empty or
    /// consists only of separators and whitespace.
    pub fn new(store: S, base_path: impl Into<String>) -> Result<Self, LocatorError> {
        let base_path = base_path.into();
        if base_path.trim().trim_matches(['\\', '/']).is_empty() {
            return Err(LocatorError::EmptyBasePath);
        }
        Ok(Self { store, base_path })
    }

    /// Return the base key path.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Walk to the leaf key of the newest API revision of the newest product.
    ///
    /// # Errors
    ///
    /// Returns the [`Miss`] describing the first level that could not be
    /// descended.
    pub fn leaf_path(&self) -> Result<String, Miss> {
        let product = self.highest_child(&self.base_path)?;
        let api_root = join_key(&join_key(&self.base_path, product.as_str()), PUBLIC_API_KEY);
        let revision = self.highest_child(&api_root)?;
        Ok(join_key(&api_root, revision.as_str()))
    }

    fn highest_child(&self, path: &str) -> Result<Version, Miss> {
        let children = self.store.list_child_keys(path);
        if children.is_empty() {
            return Err(Miss::NoVersions {
                path: path.to_owned(),
            });
        }
        highest_named(&children).map_err(|source| Miss::MalformedVersion {
            path: path.to_owned(),
            source,
        })
    }

    /// Find the library file for `identity`, reporting why it was not found.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::EmptyIdentity`] for an empty identity. Misses
    /// are returned in the inner `Result`.
    pub fn find(&self, identity: &str) -> Result<Result<PathBuf, Miss>, LocatorError> {
        if identity.trim().is_empty() {
            return Err(LocatorError::EmptyIdentity);
        }
        Ok(self.find_file(identity))
    }

    fn find_file(&self, identity: &str) -> Result<PathBuf, Miss> {
        let name = simple_name(identity).ok_or(Miss::NoSimpleName)?;
        let leaf = self.leaf_path()?;
        let value = self
            .store
            .read_value(&leaf, name)
            .ok_or_else(|| Miss::MissingValue {
                path: leaf.clone(),
                name: name.to_owned(),
            })?;
        let path = absolute(Path::new(value.trim()));
        if path.is_file() {
            Ok(path)
        } else {
            Err(Miss::MissingFile { path })
        }
    }

    /// Find the library file for `identity`.
    ///
    /// Returns `Ok(None)` on any miss; the reason is logged at debug level.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::EmptyIdentity`] for an empty identity.
    pub fn locate(&self, identity: &str) -> Result<Option<PathBuf>, LocatorError> {
        match self.find(identity)? {
            Ok(path) => {
                debug!("resolved {identity} to {}", path.display());
                Ok(Some(path))
            }
            Err(miss) => {
                debug!("no resolution for {identity}: {miss}");
                Ok(None)
            }
        }
    }

    /// Find and load the library for `identity`.
    ///
    /// Returns `Ok(None)` on any miss so the caller can fall back to its
    /// default loader.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Locator`] for an empty identity and
    /// [`LoadError::Library`] when a located file cannot be loaded.
    pub fn resolve<L: LibraryLoader>(
        &self,
        identity: &str,
        loader: &L,
    ) -> Result<Option<L::Handle>, LoadError> {
        self.locate(identity)?
            .map(|path| loader.load_path(&path))
            .transpose()
    }
}

/// Make `path` absolute against the current directory without requiring it
/// to exist.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
