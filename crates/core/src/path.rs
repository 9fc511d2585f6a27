//! Lexical path helpers

use std::io;
use std::path::{Component, Path, PathBuf};

/// Make `path` absolute and fold away `.` and `..` components
///
/// Works on the path text only: symbolic links are not resolved and the
/// path does not need to exist. `..` at the root stays at the root.
///
/// # Examples
///
/// ```
/// use pandocomatic_core::path::absolute_path;
/// use std::path::Path;
///
/// # #[cfg(unix)]
/// assert_eq!(
///     absolute_path(Path::new("/docs/sub/../shared/./data")).unwrap(),
///     Path::new("/docs/shared/data")
/// );
/// ```
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_parent_components_are_folded() {
        assert_eq!(
            absolute_path(Path::new("/tmp/config/sub/../shared")).unwrap(),
            Path::new("/tmp/config/shared")
        );
        assert_eq!(
            absolute_path(Path::new("/tmp/./a/b/../../c")).unwrap(),
            Path::new("/tmp/c")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_parent_of_root_is_root() {
        assert_eq!(absolute_path(Path::new("/../data")).unwrap(), Path::new("/data"));
    }

    #[test]
    fn test_relative_path_becomes_absolute() {
        let path = absolute_path(Path::new("data/../templates")).unwrap();
        assert!(path.is_absolute());
        assert_eq!(path, std::env::current_dir().unwrap().join("templates"));
    }
}
