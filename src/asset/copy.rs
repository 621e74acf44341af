//! Verbatim copies of matched sources into the serve root.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::SiteConfig;
use crate::core::AssetClass;
use crate::utils::glob::GlobPattern;
use crate::{debug, log};

/// Copy favicon files to the favicon output directory.
///
/// Returns the number of files copied.
pub fn copy_favicons(config: &SiteConfig) -> Result<usize> {
    let paths = config.paths.class(AssetClass::Favicon);
    let glob = GlobPattern::new(&paths.src)?;
    let dest = config.output_dir(AssetClass::Favicon);

    let sources = glob.walk(config.get_root());
    for source in &sources {
        let Some(name) = source.file_name() else {
            continue;
        };
        copy_file(source, &dest.join(name))?;
    }

    if !sources.is_empty() {
        log!("favicon"; "copied {}", sources.len());
    }
    Ok(sources.len())
}

/// Destination of `source` below `dest`, keeping its path relative to `base`.
pub fn mirror_path(source: &Path, base: &Path, dest: &Path) -> PathBuf {
    let rel = source
        .strip_prefix(base)
        .unwrap_or_else(|_| Path::new(source.file_name().unwrap_or_default()));
    dest.join(rel)
}

/// Copy one file, creating parent directories as needed.
pub fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::copy(source, dest).with_context(|| {
        format!("Failed to copy {} to {}", source.display(), dest.display())
    })?;
    debug!("copy"; "{} -> {}", source.display(), dest.display());
    Ok(())
}

/// Write bytes, creating parent directories as needed.
pub fn write_file(dest: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(dest, data).with_context(|| format!("Failed to write {}", dest.display()))
}
