//! Resolve the vendor library, then call its export entry point.
//!
//! The resolver chain is assembled before the first library request, so the
//! registry-driven locator is always consulted ahead of the platform search
//! path.

use camino::Utf8Path;
use libloading::{Library, Symbol};
use log::{debug, info};
use std::ffi::{CString, c_char};
use std::ptr;

use tagsheet_locator::loader::{DynamicLoader, LibraryLoader};
use tagsheet_locator::{DependencyLocator, ResolverChain, TomlKeyStore};

use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::session::ExportSession;

/// Signature of the export entry point: table name (null for every table)
/// and output path, both NUL-terminated UTF-8. Zero means success.
pub type EntryFn = unsafe extern "C" fn(table: *const c_char, output: *const c_char) -> i32;

/// Build the resolver chain described by `config`.
///
/// When the key store document exists, a [`DependencyLocator`] over it is
/// registered; otherwise the chain falls straight through to the platform
/// search path.
///
/// # Errors
///
/// Returns [`ExportError::Store`] when the store document exists but cannot
/// be read or parsed, and [`ExportError::Locator`] when `base_key` is empty.
pub fn build_resolver_chain(config: &ExportConfig) -> Result<ResolverChain<DynamicLoader>> {
    let mut chain = ResolverChain::new(DynamicLoader);
    match config.resolved_store_path() {
        Some(path) if path.is_file() => {
            let store = TomlKeyStore::load(path.as_std_path())?;
            let source = store.source().display().to_string();
            let locator = DependencyLocator::new(store, config.base_key.as_str())?;
            debug!("registered key store {source} under {}", locator.base_path());
            chain.register(locator);
        }
        Some(path) => debug!("no key store at {path}; using the platform search path"),
        None => debug!("no key store location; using the platform search path"),
    }
    Ok(chain)
}

/// NUL-terminated arguments for the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArguments {
    table: Option<CString>,
    output: CString,
}

impl ExportArguments {
    /// Convert the session's scope and output path.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidArgument`] when either value contains a
    /// NUL byte.
    pub fn for_session(session: &ExportSession) -> Result<Self> {
        let table = session.scope().table().map(c_string).transpose()?;
        let output = c_string(session.output_path().as_str())?;
        Ok(Self { table, output })
    }

    /// Pointer to the table name, or null for every table.
    #[must_use]
    pub fn table_ptr(&self) -> *const c_char {
        self.table.as_deref().map_or(ptr::null(), |name| name.as_ptr())
    }

    /// Pointer to the output path.
    #[must_use]
    pub fn output_ptr(&self) -> *const c_char {
        self.output.as_ptr()
    }

    /// The table name, if any.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref().and_then(|name| name.to_str().ok())
    }

    /// The output path.
    #[must_use]
    pub fn output(&self) -> Option<&Utf8Path> {
        self.output.to_str().ok().map(Utf8Path::new)
    }
}

fn c_string(value: &str) -> Result<CString> {
    CString::new(value).map_err(|source| ExportError::InvalidArgument {
        value: value.to_owned(),
        source,
    })
}

/// Run the export described by `session` against the vendor library.
///
/// # Errors
///
/// Any [`ExportError`]; see [`export_with`].
pub fn run_export(session: &ExportSession) -> Result<()> {
    let chain = build_resolver_chain(session.config())?;
    export_with(session, &chain, invoke_entry)
}

/// Load the library through `chain`, clear the previous output, and call
/// the entry point with `invoke`.
///
/// The library is loaded before the old spreadsheet is removed, so a
/// resolution failure leaves the previous export untouched.
///
/// # Errors
///
/// Returns [`ExportError::Load`] when the library cannot be loaded,
/// [`ExportError::OutputLocked`] when the old spreadsheet cannot be removed,
/// the error from `invoke`, and [`ExportError::Failed`] for a nonzero status.
pub fn export_with<L, F>(session: &ExportSession, chain: &ResolverChain<L>, invoke: F) -> Result<()>
where
    L: LibraryLoader,
    F: FnOnce(&L::Handle, &str, &ExportArguments) -> Result<i32>,
{
    let arguments = ExportArguments::for_session(session)?;
    let identity = session.config().library_identity();
    let library = chain.load(&identity)?;
    debug!("loaded {identity}");

    session.prepare_output()?;
    let code = invoke(&library, &session.config().entry_symbol, &arguments)?;
    if code != 0 {
        return Err(ExportError::Failed { code });
    }
    info!("exported tag tables to {}", session.output_path());
    Ok(())
}

fn invoke_entry(library: &Library, symbol: &str, arguments: &ExportArguments) -> Result<i32> {
    // SAFETY: the symbol is declared with the signature the vendor bridge
    // exports. A mismatch is a deployment error outside this process's
    // control.
    let entry: Symbol<'_, EntryFn> =
        unsafe { library.get(symbol.as_bytes()) }.map_err(|source| ExportError::Symbol {
            symbol: symbol.to_owned(),
            source,
        })?;
    // SAFETY: both pointers come from `CString`s owned by `arguments`, which
    // outlives the call; the table pointer is null when no table is named.
    Ok(unsafe { entry(arguments.table_ptr(), arguments.output_ptr()) })
}
