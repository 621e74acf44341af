//! Site configuration for `sitepipe.toml`.
//!
//! The file is optional: without it every section uses the built-in layout
//! (`src/assets/...` in, `public/` out).
//!
//! | Section   | Purpose                                             |
//! |-----------|-----------------------------------------------------|
//! | `[paths]` | Path registry: globs, entries, outputs per class    |
//! | `[build]` | Browser targets, minification, image compression    |
//! | `[serve]` | Dev server interface and ports                      |
//! | `[watch]` | Debounce window                                     |

pub mod section;
pub mod types;
mod util;

pub use section::{BuildConfig, PathsConfig, ServeConfig, WatchConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::cli::Cli;
use crate::core::AssetClass;
use crate::log;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::find_config_file;

/// Root configuration structure representing `sitepipe.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Config file path; may not exist (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Absolute project root (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

impl SiteConfig {
    /// Load configuration for the given command line.
    ///
    /// Root resolution: `--root` wins; otherwise the directory of the config
    /// file found by searching upward from cwd; otherwise cwd.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (config_path, root) = match &cli.root {
            Some(root) => {
                let root = crate::utils::path::normalize_path(&cwd.join(root));
                (root.join(&cli.config), root)
            }
            None => match find_config_file(&cli.config) {
                Some(path) => {
                    let root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                    (path, root)
                }
                None => (cwd.join(&cli.config), cwd),
            },
        };

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            crate::debug!("config"; "no {} found, using defaults", cli.config.display());
            Self::default()
        };

        config.config_path = config_path;
        config.set_root(&crate::utils::path::normalize_path(&root));
        config.apply_cli_options(cli);
        config.validate()?;
        Ok(config)
    }

    /// Build a config rooted at `root` with default sections.
    pub fn with_root(root: &Path) -> Self {
        let mut config = Self::default();
        config.set_root(root);
        config
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} are ignored:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    fn apply_cli_options(&mut self, cli: &Cli) {
        if let Some(port) = cli.port {
            self.serve.port = port;
        }
        if let Some(interface) = cli.interface {
            self.serve.interface = interface;
        }
    }

    /// Validate every section, reporting all problems at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();
        self.paths.validate(&mut diag);
        self.build.validate(&mut diag);
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    // ========================================================================
    // path helpers
    // ========================================================================

    pub fn get_root(&self) -> &Path {
        &self.root
    }

    pub fn set_root(&mut self, path: &Path) {
        self.root = path.to_path_buf();
    }

    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Path relative to the project root (unchanged if outside it).
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    /// Absolute serve root.
    pub fn serve_root(&self) -> PathBuf {
        self.root_join(&self.paths.serve_root)
    }

    /// Absolute output directory of an asset class.
    pub fn output_dir(&self, class: AssetClass) -> PathBuf {
        self.root_join(&self.paths.class(class).dest)
    }
}

/// Parse a config snippet, failing on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(SiteConfig::from_str("[paths\nserve_root = \"public\"").is_err());
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = test_parse_config("");
        assert_eq!(config.paths, PathsConfig::default());
        assert_eq!(config.serve, ServeConfig::default());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[paths]\nserve_root = \"dist\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = SiteConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.paths.serve_root, PathBuf::from("dist"));
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_output_dirs_are_absolute() {
        let config = SiteConfig::with_root(Path::new("/site"));
        assert_eq!(config.serve_root(), PathBuf::from("/site/public"));
        assert_eq!(
            config.output_dir(AssetClass::Styles),
            PathBuf::from("/site/public/assets/styles")
        );
    }

    #[test]
    fn test_root_relative() {
        let config = SiteConfig::with_root(Path::new("/site"));
        assert_eq!(
            config.root_relative("/site/src/index.js"),
            PathBuf::from("src/index.js")
        );
        assert_eq!(config.root_relative("/other/x"), PathBuf::from("/other/x"));
    }
}
