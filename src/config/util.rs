//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find `config_name` in the current directory or any of its ancestors.
///
/// ```text
/// /home/user/site/src/assets/  ← cwd
/// /home/user/site/sitepipe.toml ← found
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let cwd = std::env::current_dir().ok()?;
    let mut current = cwd.as_path();
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_absolute_missing_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");
        assert_eq!(find_config_file(&path), None);
    }

    #[test]
    fn test_absolute_existing_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sitepipe.toml");
        std::fs::write(&path, "").unwrap();
        assert_eq!(find_config_file(&path), Some(path));
    }
}
