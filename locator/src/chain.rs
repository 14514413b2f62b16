//! Explicit resolver registration.
//!
//! Resolvers are registered up front, before the first library is needed,
//! and consulted in registration order. When all of them miss, the library
//! is loaded by its simple name through the platform search path, and that
//! loader's failure is what the caller sees.

use crate::error::{LoadError, LocatorError};
use crate::loader::LibraryLoader;
use crate::locator::{DependencyLocator, simple_name};
use crate::store::KeyVersionStore;
use log::debug;
use std::path::PathBuf;

/// Maps a library identity to a file, or misses.
pub trait PathResolver {
    /// Return the file for `identity`, or `None` when this resolver has no
    /// opinion.
    ///
    /// # Errors
    ///
    /// Returns an error only for malformed input.
    fn locate(&self, identity: &str) -> Result<Option<PathBuf>, LocatorError>;
}

impl<S: KeyVersionStore> PathResolver for DependencyLocator<S> {
    fn locate(&self, identity: &str) -> Result<Option<PathBuf>, LocatorError> {
        Self::locate(self, identity)
    }
}

/// An ordered set of resolvers in front of a default loader.
///
/// # Examples
///
/// ```
/// use tagsheet_locator::loader::DynamicLoader;
/// use tagsheet_locator::{DependencyLocator, MemoryKeyStore, ResolverChain};
///
/// let locator = DependencyLocator::new(MemoryKeyStore::new(), r"SOFTWARE\Vendor")?;
/// let mut chain = ResolverChain::new(DynamicLoader);
/// chain.register(locator);
/// assert_eq!(chain.len(), 1);
/// # Ok::<(), tagsheet_locator::error::LocatorError>(())
/// ```
pub struct ResolverChain<L> {
    loader: L,
    resolvers: Vec<Box<dyn PathResolver + Send + Sync>>,
}

impl<L: LibraryLoader> ResolverChain<L> {
    /// Create a chain with no resolvers in front of `loader`.
    #[must_use]
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            resolvers: Vec::new(),
        }
    }

    /// Append a resolver; it is consulted after those already registered.
    pub fn register<R>(&mut self, resolver: R) -> &mut Self
    where
        R: PathResolver + Send + Sync + 'static,
    {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Return the number of registered resolvers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Return whether no resolvers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Load the library for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Library`] when a resolved file fails to load,
    /// [`LoadError::Unresolved`] when every resolver misses and the default
    /// loader fails, and [`LoadError::Locator`] for an empty identity.
    pub fn load(&self, identity: &str) -> Result<L::Handle, LoadError> {
        for resolver in &self.resolvers {
            if let Some(path) = resolver.locate(identity)? {
                return self.loader.load_path(&path);
            }
        }

        let name = simple_name(identity).unwrap_or_else(|| identity.trim());
        debug!("falling back to the default loader for {name}");
        self.loader
            .load_by_name(name)
            .map_err(|source| LoadError::Unresolved {
                name: name.to_owned(),
                source: Box::new(source),
            })
    }
}
