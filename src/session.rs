//! The explicit export session.
//!
//! Everything an export needs is captured here once, from the command line
//! and the configuration, and handed to each operation.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use std::io;

use crate::config::ExportConfig;
use crate::error::{ExportError, Result};

/// Which tag tables an export covers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExportScope {
    /// Every tag table except the default one.
    AllTables,
    /// Only the named tag table.
    Table(String),
}

impl ExportScope {
    /// Derive the scope from the optional command-line token.
    ///
    /// A blank token is treated like no token.
    #[must_use]
    pub fn from_argument(argument: Option<String>) -> Self {
        match argument {
            Some(name) if !name.trim().is_empty() => Self::Table(name),
            Some(_) | None => Self::AllTables,
        }
    }

    /// The table name, if the export is limited to one table.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::AllTables => None,
            Self::Table(name) => Some(name),
        }
    }
}

/// State shared by the operations of one export run.
#[derive(Clone, Debug)]
pub struct ExportSession {
    scope: ExportScope,
    output_path: Utf8PathBuf,
    config: ExportConfig,
}

impl ExportSession {
    /// Build a session; the output path is resolved from `config`.
    #[must_use]
    pub fn new(scope: ExportScope, config: ExportConfig) -> Self {
        let output_path = config.resolved_output_path();
        Self {
            scope,
            output_path,
            config,
        }
    }

    /// The tables to export.
    #[must_use]
    pub const fn scope(&self) -> &ExportScope {
        &self.scope
    }

    /// Where the spreadsheet is written.
    #[must_use]
    pub fn output_path(&self) -> &Utf8Path {
        &self.output_path
    }

    /// The loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Remove a previous spreadsheet and make sure its directory exists.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::OutputLocked`] when the old file cannot be
    /// deleted, typically because it is open in another program, and
    /// [`ExportError::OutputDirectory`] when the parent directory cannot be
    /// created.
    pub fn prepare_output(&self) -> Result<()> {
        if let Some(parent) = self.output_path.parent().filter(|dir| !dir.as_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ExportError::OutputDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        match fs::remove_file(&self.output_path) {
            Ok(()) => {
                debug!("removed previous export {}", self.output_path);
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ExportError::OutputLocked {
                path: self.output_path.clone(),
                source,
            }),
        }
    }
}
