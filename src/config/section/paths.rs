//! `[paths]` section: the path registry.
//!
//! Maps every asset class to its source glob, watch glob, entries and output
//! location. All values are relative to the project root.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! serve_root = "public"
//! src_root = "src"
//!
//! [paths.styles]
//! src = "src/assets/styles/**/*.scss"
//! watch = "src/assets/styles/**/*.scss"
//! dest = "public/assets/styles"
//! entry = ["src/assets/styles/style.scss"]
//! ```

use std::path::{Component, Path, PathBuf};

use globset::Glob;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::AssetClass;

/// Source/watch/output settings for one asset class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassPaths {
    /// Glob selecting the source files.
    pub src: String,
    /// Glob whose matches trigger a watch pass. `None` = not watched.
    pub watch: Option<String>,
    /// Output directory.
    pub dest: PathBuf,
    /// Bundle entry files (styles and scripts only).
    pub entry: Vec<PathBuf>,
}

impl Default for ClassPaths {
    fn default() -> Self {
        Self {
            src: String::new(),
            watch: None,
            dest: PathBuf::from("public"),
            entry: Vec::new(),
        }
    }
}

impl ClassPaths {
    fn new(src: &str, watch: Option<&str>, dest: &str, entry: &[&str]) -> Self {
        Self {
            src: src.into(),
            watch: watch.map(Into::into),
            dest: dest.into(),
            entry: entry.iter().map(PathBuf::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Document root of the dev server; every output lives below it.
    pub serve_root: PathBuf,
    /// Bundle outputs mirror the entry's directory relative to this root.
    pub src_root: PathBuf,
    pub templates: ClassPaths,
    pub styles: ClassPaths,
    pub scripts: ClassPaths,
    pub images: ClassPaths,
    pub favicon: ClassPaths,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            serve_root: "public".into(),
            src_root: "src".into(),
            templates: ClassPaths::new(
                "src/assets/pug/*.pug",
                Some("src/assets/pug/**/*.pug"),
                "public",
                &[],
            ),
            styles: ClassPaths::new(
                "src/assets/styles/**/*.scss",
                Some("src/assets/styles/**/*.scss"),
                "public/assets/styles",
                &["src/assets/styles/style.scss"],
            ),
            scripts: ClassPaths::new(
                "src/assets/scripts/**/*.js",
                Some("src/assets/scripts/**/*.js"),
                "public/assets/scripts",
                &["src/assets/scripts/index.js"],
            ),
            images: ClassPaths::new(
                "src/assets/images/**/*.{png,jpg,gif,svg,jpeg}",
                Some("src/assets/images/**/*.{png,jpg,gif,svg,jpeg}"),
                "public/assets/images",
                &[],
            ),
            favicon: ClassPaths::new("src/favicon*.{ico,png,svg}", None, "public", &[]),
        }
    }
}

impl PathsConfig {
    pub fn class(&self, class: AssetClass) -> &ClassPaths {
        match class {
            AssetClass::Templates => &self.templates,
            AssetClass::Styles => &self.styles,
            AssetClass::Scripts => &self.scripts,
            AssetClass::Images => &self.images,
            AssetClass::Favicon => &self.favicon,
        }
    }

    /// Directory a bundle for `entry` is written to, relative to the root.
    ///
    /// `src/assets/styles/style.scss` → `public/assets/styles`
    pub fn bundle_dir(&self, entry: &Path) -> PathBuf {
        let parent = entry.parent().unwrap_or(Path::new(""));
        let rel = parent.strip_prefix(&self.src_root).unwrap_or(parent);
        self.serve_root.join(rel)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.serve_root.as_os_str().is_empty() || is_escaping(&self.serve_root) {
            diag.error_with_hint(
                FieldPath::new("paths.serve_root"),
                "serve root must be a non-empty path inside the project",
                "the serve root is deleted on every full build",
            );
        }

        for class in [
            AssetClass::Templates,
            AssetClass::Styles,
            AssetClass::Scripts,
            AssetClass::Images,
            AssetClass::Favicon,
        ] {
            self.validate_class(class, diag);
        }
    }

    fn validate_class(&self, class: AssetClass, diag: &mut ConfigDiagnostics) {
        let paths = self.class(class);
        let field = field_for(class);

        for pattern in std::iter::once(&paths.src).chain(paths.watch.as_ref()) {
            if let Err(e) = Glob::new(pattern) {
                diag.error(field, format!("invalid glob `{pattern}`: {e}"));
            }
        }

        if !paths.dest.starts_with(&self.serve_root) || is_escaping(&paths.dest) {
            diag.error(
                field,
                format!(
                    "dest `{}` is outside the serve root `{}`",
                    paths.dest.display(),
                    self.serve_root.display()
                ),
            );
        }

        for entry in &paths.entry {
            if !entry.starts_with(&self.src_root) {
                diag.error(
                    field,
                    format!(
                        "entry `{}` is outside the src root `{}`",
                        entry.display(),
                        self.src_root.display()
                    ),
                );
                continue;
            }
            let out = self.bundle_dir(entry);
            if out != paths.dest {
                diag.error_with_hint(
                    field,
                    format!(
                        "entry `{}` is bundled into `{}`, not into dest `{}`",
                        entry.display(),
                        out.display(),
                        paths.dest.display()
                    ),
                    "injection only scans dest, so the bundle would never be referenced",
                );
            }
        }
    }
}

fn field_for(class: AssetClass) -> FieldPath {
    match class {
        AssetClass::Templates => FieldPath::new("paths.templates"),
        AssetClass::Styles => FieldPath::new("paths.styles"),
        AssetClass::Scripts => FieldPath::new("paths.scripts"),
        AssetClass::Images => FieldPath::new("paths.images"),
        AssetClass::Favicon => FieldPath::new("paths.favicon"),
    }
}

fn is_escaping(path: &Path) -> bool {
    path.is_absolute() || path.components().any(|c| matches!(c, Component::ParentDir))
}
