//! Template renderer: compiled pages plus bundle injection.
//!
//! | Mode      | HTML source                                  |
//! |-----------|----------------------------------------------|
//! | `Compile` | every non-partial template, freshly compiled |
//! | `Refresh` | the `*.html` already in the output directory |
//!
//! Both modes inject the current bundle references and then verify that
//! each of them resolves to a file in the serve root.

mod error;
pub mod inject;
pub mod pug;

pub use error::TemplateError;
pub use inject::Injection;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::asset::copy::write_file;
use crate::config::SiteConfig;
use crate::core::{AssetClass, RenderMode};
use crate::utils::glob::GlobPattern;
use crate::{debug, log};

/// Render pages for `mode`, returning the written HTML files.
pub fn render(config: &SiteConfig, mode: RenderMode) -> Result<Vec<PathBuf>> {
    let out_dir = config.output_dir(AssetClass::Templates);

    let pages: Vec<(PathBuf, String)> = match mode {
        RenderMode::Compile => compile_templates(config, &out_dir)?,
        RenderMode::Refresh => read_pages(&out_dir)?,
    };

    let injection = Injection::collect(config)?;
    let serve_root = config.serve_root();

    let mut written = Vec::with_capacity(pages.len());
    for (path, html) in pages {
        write_page(&path, &html, &injection, &serve_root)?;
        debug!("render"; "{}", config.root_relative(&path).display());
        written.push(path);
    }

    log!(
        "render";
        "{} page(s) {}, {} style(s), {} script(s) injected",
        written.len(),
        match mode {
            RenderMode::Compile => "compiled",
            RenderMode::Refresh => "refreshed",
        },
        injection.styles.len(),
        injection.scripts.len()
    );
    Ok(written)
}

/// Inject `injection` into `html` and write it to `path`. A page with a
/// dangling reference is never written.
fn write_page(path: &Path, html: &str, injection: &Injection, serve_root: &Path) -> Result<()> {
    let html = inject::inject(html, injection);
    inject::verify(path, &html, serve_root)?;
    write_file(path, html.as_bytes())
}

/// Templates whose file name starts with `_` are only used through `include`.
fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

fn compile_templates(config: &SiteConfig, out_dir: &Path) -> Result<Vec<(PathBuf, String)>> {
    let glob = GlobPattern::new(&config.paths.class(AssetClass::Templates).src)?;
    let sources: Vec<PathBuf> = glob
        .walk(config.get_root())
        .into_iter()
        .filter(|path| !is_partial(path))
        .collect();

    if sources.is_empty() {
        debug!("render"; "no templates match {}", glob.as_str());
    }

    sources
        .par_iter()
        .map(|source| -> Result<(PathBuf, String)> {
            let html = pug::compile_file(source)?;
            let stem = source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok((out_dir.join(format!("{stem}.html")), html))
        })
        .collect()
}

/// Top-level `*.html` files of `dir`, sorted.
fn read_pages(dir: &Path) -> Result<Vec<(PathBuf, String)>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", dir.display())),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "html") {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| -> Result<(PathBuf, String)> {
            let html = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok((path, html))
        })
        .collect()
}
