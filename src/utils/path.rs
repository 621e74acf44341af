//! Path normalization utilities.
//!
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `to_slash` - root-relative, `/`-separated form used for glob matching
//! - `is_temp_file` - editor artifacts that never trigger work

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// `path` relative to `base`, joined with `/` regardless of platform.
///
/// Returns `None` when `path` is not below `base`.
pub fn to_slash(path: &Path, base: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<_> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// Check if path is a temp/backup file (editor artifacts)
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
        || name.starts_with("#")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(
            to_slash(Path::new("/site/src/assets/a.js"), Path::new("/site")),
            Some("src/assets/a.js".to_string())
        );
        assert_eq!(to_slash(Path::new("/other/a.js"), Path::new("/site")), None);
    }

    #[test]
    fn test_temp_files() {
        assert!(is_temp_file(Path::new("src/assets/styles/.style.scss.swp")));
        assert!(is_temp_file(Path::new("src/assets/scripts/index.js~")));
        assert!(is_temp_file(Path::new("src/assets/pug/index.pug.tmp")));
        assert!(is_temp_file(Path::new("src/assets/pug/#index.pug#")));
        assert!(!is_temp_file(Path::new("src/assets/pug/index.pug")));
    }
}
