//! Output cleaner: removes generated output of one asset class.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::SiteConfig;
use crate::core::{AssetClass, CleanTarget};
use crate::debug;

/// Remove previously generated output for `target`.
///
/// Missing paths are not an error.
pub fn clean(config: &SiteConfig, target: CleanTarget) -> Result<()> {
    match target {
        CleanTarget::All => remove_dir(&config.serve_root()),
        CleanTarget::Scripts => remove_dir(&config.output_dir(AssetClass::Scripts)),
        CleanTarget::Styles => remove_dir(&config.output_dir(AssetClass::Styles)),
        CleanTarget::Images => remove_dir(&config.output_dir(AssetClass::Images)),
        CleanTarget::Html => remove_top_level_html(&config.output_dir(AssetClass::Templates)),
    }
}

fn remove_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            debug!("clean"; "removed {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", dir.display())),
    }
}

/// Only `*.html` directly inside `dir`; subdirectories are left alone.
fn remove_top_level_html(dir: &Path) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", dir.display())),
    };

    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "html") {
            match fs::remove_file(&path) {
                Ok(()) => debug!("clean"; "removed {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to remove {}", path.display()));
                }
            }
        }
    }
    Ok(())
}
