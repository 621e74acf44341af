//! Stylesheet compilation: SCSS through grass, then lightningcss.

use std::path::Path;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use super::BundleError;
use crate::config::BuildConfig;

/// Compile one style entry to its final CSS text.
///
/// `load_root` is searched for `@use`/`@import` after the entry's own
/// directory.
pub fn compile_style(entry: &Path, load_root: &Path, build: &BuildConfig) -> Result<String, BundleError> {
    let css = compile_scss(entry, load_root)?;
    transform_css(&css, entry, build)
}

fn compile_scss(entry: &Path, load_root: &Path) -> Result<String, BundleError> {
    let mut options = grass::Options::default();
    if let Some(dir) = entry.parent() {
        options = options.load_path(dir);
    }
    options = options.load_path(load_root);

    grass::from_path(entry, &options).map_err(|e| BundleError::Scss {
        path: entry.to_path_buf(),
        message: e.to_string(),
    })
}

/// Lower and prefix `css` for the configured browsers, minifying if enabled.
pub fn transform_css(css: &str, path: &Path, build: &BuildConfig) -> Result<String, BundleError> {
    let css_error = |message: String| BundleError::Css {
        path: path.to_path_buf(),
        message,
    };

    let browsers = Browsers::from_browserslist([build.browserslist.as_str()])
        .map_err(|e| css_error(format!("browserslist: {e}")))?;
    let targets = Targets::from(browsers);

    let options = ParserOptions {
        filename: path.to_string_lossy().into_owned(),
        ..ParserOptions::default()
    };
    let mut stylesheet = StyleSheet::parse(css, options).map_err(|e| css_error(e.to_string()))?;

    stylesheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| css_error(e.to_string()))?;

    let result = stylesheet
        .to_css(PrinterOptions {
            minify: build.minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| css_error(e.to_string()))?;

    Ok(result.code)
}
