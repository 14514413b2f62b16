//! Read-only hierarchical key/value stores.
//!
//! The vendor records its installations in a registry-like tree. The locator
//! only ever needs two questions answered about a node: which child keys
//! exist, and what string is stored under a given value name. Paths are
//! separated by `\` or `/` and compared case-insensitively, as registry paths
//! are.

use crate::error::StoreError;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// A read-only view of a hierarchical key/value store.
///
/// Implementations must never write. A path that does not exist behaves like
/// a key with no children and no values; the caller decides whether that is
/// an error.
#[cfg_attr(test, mockall::automock)]
pub trait KeyVersionStore {
    /// List the names of the direct child keys of `path`.
    fn list_child_keys(&self, path: &str) -> BTreeSet<String>;

    /// Read the string value `name` stored at `path`.
    ///
    /// Returns `None` when either the key or the value does not exist.
    fn read_value(&self, path: &str, name: &str) -> Option<String>;
}

impl<S: KeyVersionStore + ?Sized> KeyVersionStore for &S {
    fn list_child_keys(&self, path: &str) -> BTreeSet<String> {
        (**self).list_child_keys(path)
    }

    fn read_value(&self, path: &str, name: &str) -> Option<String> {
        (**self).read_value(path, name)
    }
}

/// Split a key path into its non-empty segments.
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['\\', '/']).filter(|s| !s.is_empty())
}

/// Join key path segments with the registry separator.
#[must_use]
pub fn join_key(parent: &str, child: &str) -> String {
    let parent = parent.trim_end_matches(['\\', '/']);
    if parent.is_empty() {
        child.to_owned()
    } else {
        format!("{parent}\\{child}")
    }
}

#[derive(Debug, Default, Clone)]
struct Node {
    /// Keyed by lowercase name; holds the name as originally spelled.
    children: BTreeMap<String, (String, Node)>,
    /// Keyed by lowercase value name.
    values: BTreeMap<String, String>,
}

impl Node {
    fn find(&self, path: &str) -> Option<&Self> {
        segments(path).try_fold(self, |node, segment| {
            node.children
                .get(&segment.to_lowercase())
                .map(|(_, child)| child)
        })
    }

    fn find_or_create(&mut self, path: &str) -> &mut Self {
        segments(path).fold(self, |node, segment| {
            &mut node
                .children
                .entry(segment.to_lowercase())
                .or_insert_with(|| (segment.to_owned(), Self::default()))
                .1
        })
    }

    fn child_names(&self) -> BTreeSet<String> {
        self.children
            .values()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// An in-memory key/value tree.
///
/// # Examples
///
/// ```
/// use tagsheet_locator::{KeyVersionStore, MemoryKeyStore};
///
/// let mut store = MemoryKeyStore::new();
/// store.insert_value(r"SOFTWARE\Vendor\18.0\PublicAPI\1.1", "Vendor.Api", "/opt/api.so");
///
/// assert!(store.list_child_keys(r"SOFTWARE\Vendor").contains("18.0"));
/// assert_eq!(
///     store.read_value(r"software\vendor\18.0\PublicAPI\1.1", "Vendor.Api").as_deref(),
///     Some("/opt/api.so"),
/// );
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyStore {
    root: Node,
}

impl MemoryKeyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `path` and any missing ancestors.
    pub fn insert_key(&mut self, path: &str) -> &mut Self {
        self.root.find_or_create(path);
        self
    }

    /// Store `value` under `name` at `path`, creating the key if needed.
    pub fn insert_value(&mut self, path: &str, name: &str, value: &str) -> &mut Self {
        self.root
            .find_or_create(path)
            .values
            .insert(name.to_lowercase(), value.to_owned());
        self
    }
}

impl KeyVersionStore for MemoryKeyStore {
    fn list_child_keys(&self, path: &str) -> BTreeSet<String> {
        self.root
            .find(path)
            .map(Node::child_names)
            .unwrap_or_default()
    }

    fn read_value(&self, path: &str, name: &str) -> Option<String> {
        self.root
            .find(path)
            .and_then(|node| node.values.get(&name.to_lowercase()))
            .cloned()
    }
}

/// A key store backed by a TOML document.
///
/// Tables are keys and string entries are values; entries of any other type
/// are ignored. Table names containing path separators are split, so both of
/// the following describe the same key:
///
/// ```toml
/// [SOFTWARE.Vendor."18.0".PublicAPI."1.1"]
/// "Vendor.Api" = "/opt/vendor/18.0/api.so"
///
/// ['SOFTWARE\Vendor\18.0\PublicAPI\1.1']
/// "Vendor.Api" = "/opt/vendor/18.0/api.so"
/// ```
#[derive(Debug, Clone)]
pub struct TomlKeyStore {
    source: PathBuf,
    inner: MemoryKeyStore,
}

impl TomlKeyStore {
    /// Load a store from the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the file cannot be read and
    /// [`StoreError::Parse`] if it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(path, &contents)
    }

    /// Parse a store from TOML text; `source` is only used in diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Parse`] if `contents` is not valid TOML.
    pub fn from_toml_str(source: &Path, contents: &str) -> Result<Self, StoreError> {
        let table: toml::Table = contents.parse().map_err(|err| StoreError::Parse {
            path: source.to_path_buf(),
            source: err,
        })?;

        let mut inner = MemoryKeyStore::new();
        collect_table(&mut inner, "", &table);
        Ok(Self {
            source: source.to_path_buf(),
            inner,
        })
    }

    /// Return the path the store was loaded from.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }
}

fn collect_table(store: &mut MemoryKeyStore, prefix: &str, table: &toml::Table) {
    for (name, value) in table {
        match value {
            toml::Value::Table(child) => {
                let path = join_key(prefix, name);
                store.insert_key(&path);
                collect_table(store, &path, child);
            }
            toml::Value::String(text) => {
                store.insert_value(prefix, name, text);
            }
            _ => log::debug!("ignoring non-string entry {name} under {prefix:?}"),
        }
    }
}

impl KeyVersionStore for TomlKeyStore {
    fn list_child_keys(&self, path: &str) -> BTreeSet<String> {
        self.inner.list_child_keys(path)
    }

    fn read_value(&self, path: &str, name: &str) -> Option<String> {
        self.inner.read_value(path, name)
    }
}
