//! Executable lookup on the platform search path
//!
//! Commands named in a configuration (processors, rename scripts) may be
//! bare program names. These are looked up the way a shell would: the
//! `PATH` environment variable is split on the platform path-list separator
//! and each directory is tried in order. On Windows the suffixes listed in
//! `PATHEXT` are tried as well. Only regular, executable files match.

use std::path::{Path, PathBuf};

/// Find `command` on the executable search path
///
/// Returns `None` when no directory on the search path contains an
/// executable file with that name.
///
/// # Example
/// ```no_run
/// use pandocomatic_core::platform::find_executable;
///
/// if let Some(pandoc) = find_executable("pandoc") {
///     println!("pandoc found at {}", pandoc.display());
/// }
/// ```
pub fn find_executable(command: &str) -> Option<PathBuf> {
    match which::which(command) {
        Ok(path) => {
            tracing::trace!("Found '{}' at {}", command, path.display());
            Some(path)
        }
        Err(e) => {
            tracing::trace!("'{}' not found on search path: {}", command, e);
            None
        }
    }
}

/// Check whether `path` is an executable regular file
///
/// On Unix this checks the permission bits. Elsewhere any existing regular
/// file counts as executable.
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };

    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}
