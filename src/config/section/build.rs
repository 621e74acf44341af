//! `[build]` section configuration.
//!
//! ```toml
//! [build]
//! browserslist = "defaults"   # CSS lowering / prefixing targets
//! minify = true               # minify bundles
//! jpeg_quality = 80           # quality for re-encoded JPEG images
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Browserslist query the stylesheet output is targeted to.
    pub browserslist: String,
    pub minify: bool,
    pub jpeg_quality: u8,
    /// oxipng preset level (0-6).
    pub png_level: u8,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            browserslist: "defaults".into(),
            minify: true,
            jpeg_quality: 80,
            png_level: 2,
        }
    }
}

impl BuildConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.browserslist.trim().is_empty() {
            diag.error(FieldPath::new("build.browserslist"), "query must not be empty");
        } else if let Err(e) = lightningcss::targets::Browsers::from_browserslist([self.browserslist.as_str()]) {
            diag.error(
                FieldPath::new("build.browserslist"),
                format!("invalid browserslist query: {e}"),
            );
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            diag.error(FieldPath::new("build.jpeg_quality"), "must be within 1..=100");
        }
        if self.png_level > 6 {
            diag.error(FieldPath::new("build.png_level"), "must be within 0..=6");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_build_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.browserslist, "defaults");
        assert!(config.build.minify);
        assert_eq!(config.build.jpeg_quality, 80);
    }

    #[test]
    fn test_quality_out_of_range() {
        let config = test_parse_config("[build]\njpeg_quality = 0\npng_level = 9");
        let mut diag = ConfigDiagnostics::new();
        config.build.validate(&mut diag);
        assert_eq!(diag.len(), 2);
    }
}
