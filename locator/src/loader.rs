//! Dynamic library loading.
//!
//! The loader is a trait so that resolution can be tested without touching
//! the operating system loader, and so that the sidecar can keep whichever
//! handle type it needs.

use crate::error::LoadError;
use libloading::Library;
use std::ffi::OsStr;
use std::path::Path;

/// Loads a library and returns a handle that keeps it mapped.
pub trait LibraryLoader {
    /// The handle type; dropping it may unload the library.
    type Handle;

    /// Load the library at an absolute `path`.
    ///
    /// Loading the same path more than once must succeed each time.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Library`] when the library cannot be loaded.
    fn load_path(&self, path: &Path) -> Result<Self::Handle, LoadError>;

    /// Load a library by bare name through the platform search path.
    ///
    /// This is the default mechanism that runs after every explicit resolver
    /// has missed.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Library`] when the library cannot be found or
    /// loaded.
    fn load_by_name(&self, name: &str) -> Result<Self::Handle, LoadError>;
}

/// Loads libraries through [`libloading`].
///
/// The operating system reference-counts loaded objects, so loading a path
/// that is already mapped returns a new handle to the same library.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicLoader;

impl LibraryLoader for DynamicLoader {
    type Handle = Library;

    fn load_path(&self, path: &Path) -> Result<Library, LoadError> {
        open(path.as_os_str())
    }

    fn load_by_name(&self, name: &str) -> Result<Library, LoadError> {
        open(libloading::library_filename(name).as_os_str())
    }
}

fn open(target: &OsStr) -> Result<Library, LoadError> {
    // SAFETY: library initialisers run on load. Only libraries named by the
    // vendor's own installation records or the platform search path are
    // opened here, which is the same trust the vendor runtime extends.
    unsafe { Library::new(target) }.map_err(|source| LoadError::Library {
        path: target.into(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_missing_path_reports_the_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent-library.so");
        let err = DynamicLoader
            .load_path(&missing)
            .expect_err("missing library");
        assert!(matches!(err, LoadError::Library { ref path, .. } if path == &missing));
    }

    #[cfg(any(target_os = "linux", target_os = "macos"))]
    #[test]
    fn loading_the_same_library_twice_succeeds() {
        #[cfg(target_os = "linux")]
        let system_library = Path::new("libc.so.6");
        #[cfg(target_os = "macos")]
        let system_library = Path::new("/usr/lib/libSystem.B.dylib");

        let first = DynamicLoader.load_path(system_library).expect("first load");
        let second = DynamicLoader.load_path(system_library).expect("second load");

        type Strlen = unsafe extern "C" fn(*const std::ffi::c_char) -> usize;
        for library in [&first, &second] {
            // SAFETY: `strlen` has this signature in every C library.
            let strlen = unsafe { library.get::<Strlen>(b"strlen") }.expect("strlen symbol");
            // SAFETY: the argument is a NUL-terminated literal.
            let len = unsafe { strlen(c"tagsheet".as_ptr()) };
            assert_eq!(len, 8);
        }
        drop(first);
        // SAFETY: as above; the symbol is only looked up, not called.
        let strlen = unsafe { second.get::<Strlen>(b"strlen") };
        assert!(strlen.is_ok(), "dropping one handle must not unload the other");
    }

    #[test]
    fn loading_unknown_name_fails() {
        let result = DynamicLoader.load_by_name("tagsheet_definitely_not_installed");
        assert!(result.is_err());
    }
}
