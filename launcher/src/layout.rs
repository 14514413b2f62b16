//! Canonical cache location of the sidecar executable.
//!
//! The cached executable lives at
//! `<shared data dir>/<publisher>/<category>/<product>/Delivery/<executable>`.
//! Publisher and product are taken from the launcher's own package metadata,
//! so two differently branded builds never share a cache.

use camino::{Utf8Path, Utf8PathBuf};

use crate::dirs::BaseDirs;
use crate::error::{LauncherError, Result};
use crate::payload::{DELIVERY_DIR, sidecar_file_name};

/// Product category segment of the cache path.
pub const PRODUCT_CATEGORY: &str = "Automation";

/// Descriptive identity of the launching product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductIdentity {
    /// Organisation publishing the add-in.
    pub publisher: String,
    /// Product family, fixed to [`PRODUCT_CATEGORY`] for builds of this crate.
    pub category: String,
    /// Product title.
    pub product: String,
}

impl ProductIdentity {
    /// Build the identity from this crate's package metadata.
    ///
    /// The publisher is the name part of the first package author; the
    /// product is the package name.
    #[must_use]
    pub fn from_package() -> Self {
        Self::from_metadata(env!("CARGO_PKG_AUTHORS"), env!("CARGO_PKG_NAME"))
    }

    /// Build the identity from a Cargo-style author list and package name.
    ///
    /// Characters that cannot appear in a path segment are replaced with `_`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsheet_launcher::layout::ProductIdentity;
    ///
    /// let identity = ProductIdentity::from_metadata("Acme Corp <ops@acme.test>:Bob", "tagsheet");
    /// assert_eq!(identity.publisher, "Acme Corp");
    /// assert_eq!(identity.product, "tagsheet");
    /// ```
    #[must_use]
    pub fn from_metadata(authors: &str, package: &str) -> Self {
        let first_author = authors.split(':').next().unwrap_or_default();
        let publisher = first_author
            .split_once('<')
            .map_or(first_author, |(name, _)| name);
        Self {
            publisher: path_segment(publisher, "Unknown Publisher"),
            category: PRODUCT_CATEGORY.to_owned(),
            product: path_segment(package, "tagsheet"),
        }
    }
}

fn path_segment(raw: &str, fallback: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            {
                '_'
            } else {
                c
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        fallback.to_owned()
    } else {
        cleaned
    }
}

/// Resolved cache paths for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    product_dir: Utf8PathBuf,
    executable_name: String,
}

impl CacheLayout {
    /// Build the layout under an explicit data root.
    #[must_use]
    pub fn new(data_root: &Utf8Path, identity: &ProductIdentity, executable_name: &str) -> Self {
        Self {
            product_dir: data_root
                .join(&identity.publisher)
                .join(&identity.category)
                .join(&identity.product),
            executable_name: executable_name.to_owned(),
        }
    }

    /// Build the layout for the sidecar under the shared data directory.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError::DataDirUnavailable`] when the data directory
    /// cannot be determined or is not valid UTF-8.
    pub fn for_sidecar(dirs: &dyn BaseDirs, identity: &ProductIdentity) -> Result<Self> {
        let raw_dir = dirs
            .shared_data_dir()
            .ok_or_else(|| LauncherError::DataDirUnavailable {
                reason: "the platform reports no data directory".to_owned(),
            })?;
        let base_dir = Utf8PathBuf::from_path_buf(raw_dir).map_err(|path| {
            LauncherError::DataDirUnavailable {
                reason: format!("{} is not valid UTF-8", path.display()),
            }
        })?;
        Ok(Self::new(&base_dir, identity, &sidecar_file_name()))
    }

    /// Directory owned by this product; staging happens inside it.
    #[must_use]
    pub fn product_dir(&self) -> &Utf8Path {
        &self.product_dir
    }

    /// Directory holding the extracted payload.
    #[must_use]
    pub fn delivery_dir(&self) -> Utf8PathBuf {
        self.product_dir.join(DELIVERY_DIR)
    }

    /// File name of the cached executable.
    #[must_use]
    pub fn executable_name(&self) -> &str {
        &self.executable_name
    }

    /// Full path of the cached executable.
    #[must_use]
    pub fn executable_path(&self) -> Utf8PathBuf {
        self.delivery_dir().join(&self.executable_name)
    }
}
