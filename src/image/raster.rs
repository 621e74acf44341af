//! Raster compression: lossless PNG, re-encoded JPEG.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

/// Losslessly optimize a PNG with the given oxipng preset (0-6).
pub fn optimize_png(data: &[u8], level: u8) -> Result<Vec<u8>> {
    let options = oxipng::Options::from_preset(level);
    oxipng::optimize_from_memory(data, &options).context("Failed to optimize PNG")
}

/// Decode and re-encode a JPEG at `quality` (1-100).
pub fn recompress_jpeg(data: &[u8], quality: u8) -> Result<Vec<u8>> {
    let img = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .context("Failed to decode JPEG")?;

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .context("Failed to encode JPEG")?;
    Ok(buf)
}

/// Encode an image as PNG (used to build fixtures).
#[cfg(test)]
pub(crate) fn encode_png(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}
