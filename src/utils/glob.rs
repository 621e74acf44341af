//! Root-relative glob matching.
//!
//! Patterns such as `src/assets/images/**/*.{png,jpg}` are matched against
//! `/`-separated paths relative to the project root. `*` never crosses a
//! directory boundary; `**` does.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use jwalk::WalkDir;

use super::path::to_slash;

/// A compiled glob with the literal directory it is anchored at.
#[derive(Clone)]
pub struct GlobPattern {
    pattern: String,
    matcher: GlobMatcher,
    /// Longest leading run of components without glob syntax.
    base: PathBuf,
}

impl fmt::Debug for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobPattern")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob `{pattern}`"))?
            .compile_matcher();

        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
            base: literal_base(pattern),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Directory (relative to the root) every match lives under.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Match a `/`-separated root-relative path.
    pub fn is_match(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }

    /// Match an absolute path by making it relative to `root` first.
    pub fn matches_path(&self, path: &Path, root: &Path) -> bool {
        to_slash(path, root).is_some_and(|rel| self.is_match(&rel))
    }

    /// All files under `root` matching the pattern, sorted.
    ///
    /// A missing base directory yields an empty list.
    pub fn walk(&self, root: &Path) -> Vec<PathBuf> {
        let base = root.join(&self.base);
        if !base.is_dir() {
            return Vec::new();
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&base)
            .sort(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path())
            .filter(|path| self.matches_path(path, root))
            .collect();
        files.sort();
        files
    }
}

fn literal_base(pattern: &str) -> PathBuf {
    let parts: Vec<&str> = pattern.split('/').collect();
    let literal = parts
        .iter()
        .take_while(|part| !part.contains(['*', '?', '[', '{']))
        .count();

    // a fully literal pattern names a file; anchor at its directory
    let take = if literal == parts.len() {
        literal.saturating_sub(1)
    } else {
        literal
    };
    parts[..take].iter().collect()
}
