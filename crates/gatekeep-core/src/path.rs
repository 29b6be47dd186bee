//! Path validation before anything reaches a command line.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::domain::error::PathValidationError;

/// Validate and resolve `path`.
///
/// Embedded NUL bytes are stripped. An input that is empty, before or after
/// stripping, is rejected. Absolute paths are returned unchanged; relative
/// paths are joined onto `cwd`, or onto the process working directory when no
/// `cwd` is given.
pub fn normalize(
    path: impl AsRef<Path>,
    cwd: Option<&Path>,
) -> Result<PathBuf, PathValidationError> {
    let cleaned = strip_nul(path.as_ref());
    if cleaned.as_os_str().is_empty() {
        return Err(PathValidationError::Empty);
    }

    if cleaned.is_absolute() {
        return Ok(cleaned);
    }

    let base = match cwd {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|e| PathValidationError::Unresolvable {
            path: cleaned.display().to_string(),
            reason: e.to_string(),
        })?,
    };

    Ok(base.join(cleaned))
}

/// Normalize every path, failing on the first invalid one.
pub fn normalize_all<P: AsRef<Path>>(
    paths: &[P],
    cwd: Option<&Path>,
) -> Result<Vec<PathBuf>, PathValidationError> {
    paths.iter().map(|p| normalize(p, cwd)).collect()
}

#[cfg(unix)]
fn strip_nul(path: &Path) -> PathBuf {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    let bytes: Vec<u8> = path
        .as_os_str()
        .as_bytes()
        .iter()
        .copied()
        .filter(|b| *b != 0)
        .collect();
    PathBuf::from(OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn strip_nul(path: &Path) -> PathBuf {
    let cleaned: String = path.to_string_lossy().chars().filter(|c| *c != '\0').collect();
    PathBuf::from(OsString::from(cleaned))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_resolves_against_cwd() {
        let resolved = normalize("src/lib.rs", Some(Path::new("/repo"))).unwrap();
        assert_eq!(resolved, PathBuf::from("/repo/src/lib.rs"));
    }

    #[test]
    fn test_absolute_path_passes_through() {
        let resolved = normalize("/etc/hosts", Some(Path::new("/repo"))).unwrap();
        assert_eq!(resolved, PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn test_nul_bytes_are_stripped() {
        let resolved = normalize("src/ma\0in.rs", Some(Path::new("/repo"))).unwrap();
        assert_eq!(resolved, PathBuf::from("/repo/src/main.rs"));
    }

    #[test]
    fn test_empty_path_is_rejected() {
        assert_eq!(normalize("", None), Err(PathValidationError::Empty));
        assert_eq!(normalize("\0\0", None), Err(PathValidationError::Empty));
    }

    #[test]
    fn test_default_cwd_is_process_directory() {
        let resolved = normalize("file.txt", None).unwrap();
        assert_eq!(resolved, std::env::current_dir().unwrap().join("file.txt"));
    }

    #[test]
    fn test_dash_prefixed_path_is_kept_verbatim() {
        let resolved = normalize("-rf", Some(Path::new("/repo"))).unwrap();
        assert_eq!(resolved, PathBuf::from("/repo/-rf"));
    }

    #[test]
    fn test_normalize_all_fails_on_first_invalid() {
        let err = normalize_all(&["a.rs", ""], Some(Path::new("/repo"))).unwrap_err();
        assert_eq!(err, PathValidationError::Empty);
    }
}
