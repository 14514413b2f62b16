//! Directory resolution abstraction for platform-specific paths.
//!
//! The sidecar cache lives under the per-machine shared data directory
//! (`%ProgramData%` on Windows). Other platforms have no writable
//! machine-wide equivalent for unprivileged users, so the platform data
//! directory from `directories-next` is used there instead.

use std::path::PathBuf;

/// Source of base directories, abstracted for testing.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Return the shared data directory, if the platform provides one.
    fn shared_data_dir(&self) -> Option<PathBuf>;
}

/// Resolves directories from the running system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    #[cfg(windows)]
    fn shared_data_dir(&self) -> Option<PathBuf> {
        std::env::var_os("ProgramData")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from(r"C:\ProgramData")))
    }

    #[cfg(not(windows))]
    fn shared_data_dir(&self) -> Option<PathBuf> {
        directories_next::BaseDirs::new().map(|dirs| dirs.data_dir().to_path_buf())
    }
}

/// Uses a fixed directory, typically from a command-line override.
#[derive(Debug, Clone)]
pub struct FixedBaseDirs(pub PathBuf);

impl BaseDirs for FixedBaseDirs {
    fn shared_data_dir(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_dirs_return_their_path() {
        let dirs = FixedBaseDirs(PathBuf::from("/srv/shared"));
        assert_eq!(dirs.shared_data_dir(), Some(PathBuf::from("/srv/shared")));
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    #[test]
    fn system_dirs_follow_xdg_data_home() {
        temp_env::with_var("XDG_DATA_HOME", Some("/tmp/tagsheet-xdg"), || {
            assert_eq!(
                SystemBaseDirs.shared_data_dir(),
                Some(PathBuf::from("/tmp/tagsheet-xdg"))
            );
        });
    }

    #[cfg(windows)]
    #[test]
    fn system_dirs_follow_program_data() {
        temp_env::with_var("ProgramData", Some(r"D:\Shared"), || {
            assert_eq!(
                SystemBaseDirs.shared_data_dir(),
                Some(PathBuf::from(r"D:\Shared"))
            );
        });
    }
}
