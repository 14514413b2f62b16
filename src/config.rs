//! Sidecar configuration loaded from `tagsheet.toml`.
//!
//! Every field has a default, so a missing file is not an error. The file is
//! looked up at the path passed with `--config`, then in the platform
//! configuration directory. Unknown keys are rejected so that typos surface
//! instead of silently falling back to defaults.

use camino::{Utf8Path, Utf8PathBuf};
use directories_next::{ProjectDirs, UserDirs};
use serde::Deserialize;
use std::fs;

use crate::error::ConfigError;

/// File name of the sidecar configuration.
pub const CONFIG_FILE_NAME: &str = "tagsheet.toml";

/// Registry key under which the vendor records its installations.
pub const DEFAULT_BASE_KEY: &str = r"SOFTWARE\Siemens\Automation\Openness";

/// Simple name of the vendor engineering API library.
pub const DEFAULT_LIBRARY: &str = "Siemens.Engineering";

/// Exported symbol that runs the tag table export.
pub const DEFAULT_ENTRY_SYMBOL: &str = "tagsheet_export";

/// File name of the key store document next to the configuration.
pub const DEFAULT_STORE_FILE: &str = "registry.toml";

/// File name of the exported spreadsheet.
pub const DEFAULT_OUTPUT_FILE: &str = "Output.xlsx";

/// Configuration of the export sidecar.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Key store document describing the vendor installations.
    ///
    /// Defaults to `registry.toml` in the platform configuration directory.
    pub store_path: Option<Utf8PathBuf>,
    /// Key holding one child per installed product version.
    pub base_key: String,
    /// Simple name of the library to resolve.
    pub library: String,
    /// Symbol called once the library is loaded.
    pub entry_symbol: String,
    /// Where the spreadsheet is written; defaults to the desktop.
    pub output_path: Option<Utf8PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            base_key: DEFAULT_BASE_KEY.to_owned(),
            library: DEFAULT_LIBRARY.to_owned(),
            entry_symbol: DEFAULT_ENTRY_SYMBOL.to_owned(),
            output_path: None,
        }
    }
}

impl ExportConfig {
    /// Parse a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document is not valid TOML or
    /// contains unknown keys or mistyped values.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use tagsheet::config::ExportConfig;
    ///
    /// let config = ExportConfig::from_toml_str(
    ///     Utf8Path::new("tagsheet.toml"),
    ///     "library = \"Vendor.Api\"\n",
    /// )?;
    /// assert_eq!(config.library, "Vendor.Api");
    /// assert_eq!(config.entry_symbol, "tagsheet_export");
    /// # Ok::<(), tagsheet::error::ConfigError>(())
    /// ```
    pub fn from_toml_str(source: &Utf8Path, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|err| ConfigError::Parse {
            path: source.to_path_buf(),
            source: Box::new(err),
        })
    }

    /// Read and parse the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is malformed.
    pub fn load_from(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(path, &contents)
    }

    /// Load the configuration from `explicit` or the platform configuration
    /// directory.
    ///
    /// # Errors
    ///
    /// See [`Self::load_with`].
    pub fn load(explicit: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        Self::load_with(explicit, default_config_path)
    }

    /// Load the configuration, discovering the default location with
    /// `discover`.
    ///
    /// An explicit path must exist. A discovered path is used only when a
    /// file is present there; otherwise the defaults apply.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`] for the file
    /// that was chosen.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsheet::config::ExportConfig;
    ///
    /// let config = ExportConfig::load_with(None, || None)?;
    /// assert_eq!(config, ExportConfig::default());
    /// # Ok::<(), tagsheet::error::ConfigError>(())
    /// ```
    pub fn load_with<F>(explicit: Option<&Utf8Path>, discover: F) -> Result<Self, ConfigError>
    where
        F: FnOnce() -> Option<Utf8PathBuf>,
    {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match discover() {
            Some(path) if path.is_file() => Self::load_from(&path),
            Some(_) | None => Ok(Self::default()),
        }
    }

    /// Identity string requested from the resolver chain.
    #[must_use]
    pub fn library_identity(&self) -> String {
        format!("{}, Culture=neutral", self.library.trim())
    }

    /// The key store document to read, if one can be determined.
    #[must_use]
    pub fn resolved_store_path(&self) -> Option<Utf8PathBuf> {
        self.store_path
            .clone()
            .or_else(|| config_dir().map(|dir| dir.join(DEFAULT_STORE_FILE)))
    }

    /// The spreadsheet path, falling back to the desktop, then the home
    /// directory, then the working directory.
    #[must_use]
    pub fn resolved_output_path(&self) -> Utf8PathBuf {
        self.output_path.clone().unwrap_or_else(|| {
            default_output_dir().map_or_else(
                || Utf8PathBuf::from(DEFAULT_OUTPUT_FILE),
                |dir| dir.join(DEFAULT_OUTPUT_FILE),
            )
        })
    }
}

fn config_dir() -> Option<Utf8PathBuf> {
    let dirs = ProjectDirs::from("dev", "tagsheet", "tagsheet")?;
    Utf8PathBuf::from_path_buf(dirs.config_dir().to_path_buf()).ok()
}

/// Return the platform location of `tagsheet.toml`.
#[must_use]
pub fn default_config_path() -> Option<Utf8PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

fn default_output_dir() -> Option<Utf8PathBuf> {
    let dirs = UserDirs::new()?;
    let dir = dirs.desktop_dir().unwrap_or_else(|| dirs.home_dir());
    Utf8PathBuf::from_path_buf(dir.to_path_buf()).ok()
}
