//! Bundle builder: hashed, minified script and style bundles.
//!
//! Every entry is compiled in memory first. Files are written only once all
//! entries of the pass have compiled, so a failing pass never leaves a
//! partial set of hashed outputs behind.
//!
//! ```text
//! src/assets/styles/style.scss  →  public/assets/styles/bundle-style-1a2b3c4d.css
//! src/assets/scripts/index.js   →  public/assets/scripts/bundle-index-9f8e7d6c.js
//! ```

mod error;
pub mod minify;
pub mod script;
pub mod style;

pub use error::BundleError;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::asset::copy::write_file;
use crate::config::SiteConfig;
use crate::core::{AssetClass, BundleTarget};
use crate::utils::glob::GlobPattern;
use crate::utils::hash::fingerprint;
use crate::{debug, log};

/// Output kind of a bundle entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    Script,
    Style,
}

impl BundleKind {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Script => "js",
            Self::Style => "css",
        }
    }

    const fn class(self) -> AssetClass {
        match self {
            Self::Script => AssetClass::Scripts,
            Self::Style => AssetClass::Styles,
        }
    }
}

/// A compiled entry, not yet written.
#[derive(Debug)]
pub struct Bundle {
    pub entry: PathBuf,
    /// Absolute output file.
    pub output: PathBuf,
    pub code: String,
}

/// File name for a bundle: `bundle-<stem>-<hash>.<ext>`.
pub fn artifact_name(stem: &str, code: &str, kind: BundleKind) -> String {
    format!("bundle-{stem}-{}.{}", fingerprint(code), kind.extension())
}

/// Compile and write the bundles selected by `target`, scripts first.
///
/// Returns the written files.
pub fn build_bundles(config: &SiteConfig, target: BundleTarget) -> Result<Vec<PathBuf>> {
    let mut kinds = Vec::with_capacity(2);
    if target.includes_scripts() {
        kinds.push(BundleKind::Script);
    }
    if target.includes_styles() {
        kinds.push(BundleKind::Style);
    }

    let mut bundles = Vec::new();
    for kind in kinds {
        for entry in &config.paths.class(kind.class()).entry {
            bundles.push(compile_entry(config, kind, entry)?);
        }
    }

    let mut written = Vec::with_capacity(bundles.len());
    for bundle in bundles {
        write_file(&bundle.output, bundle.code.as_bytes())?;
        debug!("bundle"; "{} -> {}", bundle.entry.display(), bundle.output.display());
        written.push(bundle.output);
    }

    for path in &written {
        log!("bundle"; "{}", config.root_relative(path).display());
    }
    Ok(written)
}

/// Compile one entry (path relative to the project root) in memory.
pub fn compile_entry(config: &SiteConfig, kind: BundleKind, entry: &Path) -> Result<Bundle, BundleError> {
    let source = config.root_join(entry);
    if !source.is_file() {
        return Err(BundleError::EntryNotFound(source));
    }

    let code = match kind {
        BundleKind::Script => {
            let bundled = script::bundle_script(&source)?;
            minify::emit_js(&bundled, &source, &config.build).map_err(|message| BundleError::Parse {
                path: source.clone(),
                message,
            })?
        }
        BundleKind::Style => {
            let load_root = style_load_root(config);
            style::compile_style(&source, &load_root, &config.build)?
        }
    };

    let stem = entry
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let output = config
        .root_join(config.paths.bundle_dir(entry))
        .join(artifact_name(&stem, &code, kind));

    Ok(Bundle {
        entry: entry.to_path_buf(),
        output,
        code,
    })
}

/// Literal base of the styles source glob, e.g. `src/assets/styles`.
fn style_load_root(config: &SiteConfig) -> PathBuf {
    let pattern = &config.paths.class(AssetClass::Styles).src;
    match GlobPattern::new(pattern) {
        Ok(glob) => config.root_join(glob.base()),
        Err(_) => config.get_root().to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::clean;
    use crate::core::CleanTarget;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/assets/styles")).unwrap();
        fs::create_dir_all(root.join("src/assets/scripts")).unwrap();
        fs::write(root.join("src/assets/styles/style.scss"), "body{color:red}").unwrap();
        fs::write(
            root.join("src/assets/scripts/index.js"),
            "document.body.dataset.ready = 'yes';\n",
        )
        .unwrap();
        let config = SiteConfig::with_root(root);
        (dir, config)
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    fn is_artifact(name: &str, stem: &str, ext: &str) -> bool {
        let Some(hash) = name
            .strip_prefix(&format!("bundle-{stem}-"))
            .and_then(|rest| rest.strip_suffix(&format!(".{ext}")))
        else {
            return false;
        };
        hash.len() == 8 && hash.chars().all(|c| c.is_ascii_hexdigit())
    }

    #[test]
    fn test_artifact_name() {
        let name = artifact_name("style", "body{color:red}", BundleKind::Style);
        assert!(is_artifact(&name, "style", "css"), "{name}");
        assert_eq!(
            name,
            format!("bundle-style-{}.css", fingerprint("body{color:red}"))
        );
    }

    #[test]
    fn test_style_bundle() {
        let (_dir, config) = site();
        let written = build_bundles(&config, BundleTarget::Styles).unwrap();
        assert_eq!(written.len(), 1);

        let names = files_in(&config.output_dir(AssetClass::Styles));
        assert_eq!(names.len(), 1);
        assert!(is_artifact(&names[0], "style", "css"), "{names:?}");
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), "body{color:red}");
        assert!(!config.output_dir(AssetClass::Scripts).exists());
    }

    #[test]
    fn test_all_bundles_scripts_first() {
        let (_dir, config) = site();
        let written = build_bundles(&config, BundleTarget::All).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].extension().unwrap(), "js");
        assert_eq!(written[1].extension().unwrap(), "css");
    }

    #[test]
    fn test_clean_build_twice_leaves_one_style() {
        let (dir, config) = site();
        clean::clean(&config, CleanTarget::Styles).unwrap();
        build_bundles(&config, BundleTarget::Styles).unwrap();

        fs::write(dir.path().join("src/assets/styles/style.scss"), "body{color:blue}").unwrap();
        clean::clean(&config, CleanTarget::Styles).unwrap();
        build_bundles(&config, BundleTarget::Styles).unwrap();

        let names = files_in(&config.output_dir(AssetClass::Styles));
        assert_eq!(names.len(), 1, "{names:?}");
    }

    #[test]
    fn test_failed_entry_writes_nothing() {
        let (dir, config) = site();
        fs::write(dir.path().join("src/assets/scripts/index.js"), "const = ;").unwrap();

        let err = build_bundles(&config, BundleTarget::All).unwrap_err();
        assert!(err.to_string().contains("index.js"), "{err}");
        assert!(!config.output_dir(AssetClass::Scripts).exists());
        assert!(!config.output_dir(AssetClass::Styles).exists());
    }

    #[test]
    fn test_script_bundle_follows_browserslist() {
        let (dir, mut config) = site();
        fs::write(
            dir.path().join("src/assets/scripts/index.js"),
            "const o = window.cfg;\nlet w = o?.a ?? 1;\nw ||= 2;\nconsole.log(w);\n",
        )
        .unwrap();
        config.build.browserslist = "safari 10, ie 11".into();

        let entry = Path::new("src/assets/scripts/index.js");
        let bundle = compile_entry(&config, BundleKind::Script, entry).unwrap();
        for syntax in ["?.", "??", "||="] {
            assert!(!bundle.code.contains(syntax), "{syntax} in {}", bundle.code);
        }
    }

    #[test]
    fn test_missing_entry() {
        let (dir, config) = site();
        fs::remove_file(dir.path().join("src/assets/styles/style.scss")).unwrap();
        let err = compile_entry(
            &config,
            BundleKind::Style,
            Path::new("src/assets/styles/style.scss"),
        )
        .unwrap_err();
        assert!(matches!(err, BundleError::EntryNotFound(_)));
    }

    #[test]
    fn test_hash_follows_content() {
        let (dir, config) = site();
        let entry = Path::new("src/assets/scripts/index.js");
        let first = compile_entry(&config, BundleKind::Script, entry).unwrap();
        let again = compile_entry(&config, BundleKind::Script, entry).unwrap();
        assert_eq!(first.output, again.output);

        fs::write(dir.path().join(entry), "document.title = 'changed';\n").unwrap();
        let changed = compile_entry(&config, BundleKind::Script, entry).unwrap();
        assert_ne!(first.output, changed.output);
    }
}
