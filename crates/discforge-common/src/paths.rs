//! Path utilities for naming and locating pipeline files.
//!
//! Disc labels come straight from the volume and may contain characters that
//! are not valid in file names on every platform, so everything that becomes
//! part of a path goes through [`sanitize_filename`] first.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Extension of the intermediate container written by the extraction tool.
pub const CONTAINER_EXTENSION: &str = "mkv";

/// Label used when neither the OS nor the disc itself names the volume.
pub const UNLABELED_DISC: &str = "UNLABELED_DISC";

static INVALID_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._ \-]").expect("static regex"));

/// Replace every character outside `[A-Za-z0-9._ -]` with an underscore.
///
/// # Examples
///
/// ```
/// use discforge_common::paths::sanitize_filename;
///
/// assert_eq!(sanitize_filename("STAR WARS: EP IV"), "STAR WARS_ EP IV");
/// assert_eq!(sanitize_filename("a/b\\c"), "a_b_c");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    INVALID_FILENAME_CHARS.replace_all(name, "_").into_owned()
}

/// Check if a path has the intermediate container extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use discforge_common::paths::is_container_file;
///
/// assert!(is_container_file(Path::new("/raw/DISC/title_t01.mkv")));
/// assert!(is_container_file(Path::new("TITLE_T02.MKV")));
/// assert!(!is_container_file(Path::new("log_20250101_120000.txt")));
/// ```
pub fn is_container_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(CONTAINER_EXTENSION))
        .unwrap_or(false)
}

/// Create a directory and all of its parents if missing.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_allowed_characters() {
        assert_eq!(sanitize_filename("Disc_1 - Extras.v2"), "Disc_1 - Extras.v2");
    }

    #[test]
    fn test_sanitize_replaces_each_invalid_character() {
        assert_eq!(sanitize_filename("A:B*C?"), "A_B_C_");
        assert_eq!(sanitize_filename("Amélie"), "Am_lie");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn test_is_container_file_without_extension() {
        assert!(!is_container_file(Path::new("/raw/DISC/mkv")));
    }

    #[test]
    fn test_ensure_dir_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // Idempotent.
        ensure_dir(&nested).unwrap();
    }
}
