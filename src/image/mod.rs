//! Image moving with optional compression.
//!
//! # Modules
//!
//! - [`raster`]: PNG (lossless) and JPEG (re-encode) compression
//! - [`svg`]: comment and metadata stripping for SVG

pub mod raster;
pub mod svg;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::asset::copy::{copy_file, mirror_path, write_file};
use crate::config::{BuildConfig, SiteConfig};
use crate::core::{AssetClass, ImageMode};
use crate::logger::ProgressLine;
use crate::utils::glob::GlobPattern;
use crate::{debug, log};

/// Image formats with a compressor of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Svg,
    Other,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("png") => Self::Png,
            Some("jpg" | "jpeg") => Self::Jpeg,
            Some("svg") => Self::Svg,
            _ => Self::Other,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Svg => "svg",
            Self::Other => "other",
        }
    }
}

/// Copy matched images into the images output directory.
///
/// Structure relative to the images source root is preserved. With
/// [`ImageMode::All`] each file is compressed first; a file that fails to
/// compress is copied verbatim with a warning. Returns the number of files
/// written. No matches: nothing is created.
pub fn move_images(config: &SiteConfig, mode: ImageMode) -> Result<usize> {
    let glob = GlobPattern::new(&config.paths.class(AssetClass::Images).src)?;
    let sources = glob.walk(config.get_root());
    if sources.is_empty() {
        debug!("images"; "no sources match {}", glob.as_str());
        return Ok(0);
    }

    let base = config.root_join(glob.base());
    let dest = config.output_dir(AssetClass::Images);
    let jobs: Vec<(PathBuf, PathBuf)> = sources
        .into_iter()
        .map(|source| {
            let target = mirror_path(&source, &base, &dest);
            (source, target)
        })
        .collect();

    match mode {
        ImageMode::OnlyMove => {
            for (source, target) in &jobs {
                copy_file(source, target)?;
            }
        }
        ImageMode::All => compress_all(&jobs, &config.build)?,
    }

    log!("images"; "{} file(s) -> {}", jobs.len(), config.root_relative(&dest).display());
    Ok(jobs.len())
}

fn compress_all(jobs: &[(PathBuf, PathBuf)], build: &BuildConfig) -> Result<()> {
    let count = |format: ImageFormat| {
        jobs.iter()
            .filter(|(source, _)| ImageFormat::from_path(source) == format)
            .count()
    };
    let formats = [
        ImageFormat::Png,
        ImageFormat::Jpeg,
        ImageFormat::Svg,
        ImageFormat::Other,
    ];
    let items: Vec<_> = formats.iter().map(|f| (f.label(), count(*f))).collect();
    let progress = ProgressLine::new("images", &items);

    let result = jobs.par_iter().try_for_each(|(source, target)| {
        let format = ImageFormat::from_path(source);
        compress_file(source, target, format, build)?;
        progress.inc(format.label());
        Ok::<_, anyhow::Error>(())
    });

    progress.finish();
    result
}

fn compress_file(source: &Path, target: &Path, format: ImageFormat, build: &BuildConfig) -> Result<()> {
    if format == ImageFormat::Other {
        return copy_file(source, target);
    }

    let data = fs::read(source).with_context(|| format!("Failed to read {}", source.display()))?;
    match compress(&data, format, build) {
        Ok(compressed) if compressed.len() < data.len() => {
            debug!("images"; "{}: {} -> {} bytes", source.display(), data.len(), compressed.len());
            write_file(target, &compressed)
        }
        Ok(_) => write_file(target, &data),
        Err(e) => {
            log!("warning"; "{}: {:#}, copying as is", source.display(), e);
            write_file(target, &data)
        }
    }
}

/// Compress `data` for `format`. `Other` is returned unchanged.
pub fn compress(data: &[u8], format: ImageFormat, build: &BuildConfig) -> Result<Vec<u8>> {
    match format {
        ImageFormat::Png => raster::optimize_png(data, build.png_level),
        ImageFormat::Jpeg => raster::recompress_jpeg(data, build.jpeg_quality),
        ImageFormat::Svg => svg::optimize_svg(data),
        ImageFormat::Other => Ok(data.to_vec()),
    }
}
